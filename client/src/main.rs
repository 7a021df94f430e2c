use anyhow::{format_err, Result};
use clap::Parser;
use configparser::ini::Ini;
use epoch_pool::ledger::{credits, rewards};
use serde_json::json;
use solana_client::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use std::str::FromStr;

mod instructions;
use instructions::events::*;
use instructions::pool_instructions::*;
use instructions::rpc::*;
use instructions::utils::*;

#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    http_url: String,
    ws_url: String,
    payer_path: String,
    forwarder_path: String,
    epoch_pool_program: Pubkey,
}

fn load_cfg(client_config: &str) -> Result<ClientConfig> {
    let mut config = Ini::new();
    config
        .load(client_config)
        .map_err(|err| format_err!("failed to load {}: {}", client_config, err))?;
    let required = |key: &str| -> Result<String> {
        match config.get("Global", key) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(format_err!("{} must not be empty", key)),
        }
    };
    let http_url = required("http_url")?;
    let ws_url = required("ws_url")?;
    let payer_path = required("payer_path")?;
    // The forwarder defaults to the payer for local setups.
    let forwarder_path = config
        .get("Global", "forwarder_path")
        .filter(|path| !path.is_empty())
        .unwrap_or_else(|| payer_path.clone());
    let epoch_pool_program = Pubkey::from_str(&required("epoch_pool_program")?)
        .map_err(|err| format_err!("invalid epoch_pool_program: {}", err))?;

    Ok(ClientConfig {
        http_url,
        ws_url,
        payer_path,
        forwarder_path,
        epoch_pool_program,
    })
}

fn read_keypair_file(s: &str) -> Result<Keypair> {
    solana_sdk::signature::read_keypair_file(s)
        .map_err(|_| format_err!("failed to read keypair from {}", s))
}

#[derive(Debug, Parser)]
pub struct Opts {
    /// Simulate the transaction and print the program logs instead of sending it.
    #[arg(long, global = true)]
    pub dry_run: bool,
    #[clap(subcommand)]
    pub command: EpochPoolCommands,
}

#[derive(Debug, Parser)]
pub enum EpochPoolCommands {
    InitialisePool {
        #[arg(long)]
        asset_mint: Pubkey,
        #[arg(long)]
        fee_vault: Pubkey,
        #[arg(long)]
        forwarder: Pubkey,
        /// Basis points taken from every reward inflow.
        #[arg(long)]
        fee_rate: u64,
        #[arg(long)]
        mining_program: Pubkey,
        #[arg(long)]
        miner_position: Pubkey,
        #[arg(long)]
        mining_stake_vault: Pubkey,
        #[arg(long)]
        bonus_program: Pubkey,
        /// Hex encoded 8 byte prefix every receipt must start with.
        #[arg(long)]
        receipt_tag: String,
        #[arg(long)]
        min_receipt_len: u16,
        #[arg(long)]
        max_receipt_len: u16,
    },
    OpenOwnerLedger {},
    Checkpoint {},
    Deposit {
        #[arg(long)]
        amount: u64,
        /// Defaults to the payer's associated token account.
        #[arg(long)]
        owner_token: Option<Pubkey>,
    },
    WithdrawPrincipal {
        #[arg(long)]
        amount: u64,
        #[arg(long)]
        recipient_token: Option<Pubkey>,
    },
    SubmitReceipt {
        /// Hex encoded receipt, forwarded verbatim.
        #[arg(long)]
        payload: String,
        #[arg(long)]
        miner_credits: Pubkey,
        #[arg(long, value_delimiter = ',')]
        extra_accounts: Vec<Pubkey>,
    },
    ClaimRegular {
        #[arg(long, value_delimiter = ',', required = true)]
        epochs: Vec<u64>,
        #[arg(long, value_delimiter = ',')]
        extra_accounts: Vec<Pubkey>,
    },
    ClaimBonus {
        #[arg(long, value_delimiter = ',', required = true)]
        epochs: Vec<u64>,
        /// One bonus flag account per epoch, same order as `epochs`.
        #[arg(long, value_delimiter = ',', required = true)]
        bonus_flags: Vec<Pubkey>,
        #[arg(long, value_delimiter = ',')]
        extra_accounts: Vec<Pubkey>,
    },
    ClaimOwner {
        #[arg(long, value_delimiter = ',', required = true)]
        epochs: Vec<u64>,
        #[arg(long)]
        recipient_token: Option<Pubkey>,
    },
    UnstakeAtEpochEnd {},
    FinalizeWithdraw {},
    Restake {},
    StakePrincipal {},
    ShowPool {
        #[arg(long, value_delimiter = ',')]
        epochs: Vec<u64>,
    },
    ShowOwner {
        /// Defaults to the payer.
        #[arg(long)]
        owner: Option<Pubkey>,
        #[arg(long, value_delimiter = ',')]
        epochs: Vec<u64>,
    },
    DecodeTxn {
        #[arg(long)]
        signature: String,
    },
}

fn process_instructions(
    rpc_client: &RpcClient,
    config: &ClientConfig,
    payer: &Keypair,
    cosigners: &[&Keypair],
    instructions: &[Instruction],
    dry_run: bool,
) -> Result<()> {
    let mut signers = vec![payer];
    signers.extend(
        cosigners
            .iter()
            .filter(|k| k.pubkey() != payer.pubkey())
            .copied(),
    );
    let recent_hash = rpc_client.get_latest_blockhash()?;
    let txn = Transaction::new_signed_with_payer(
        instructions,
        Some(&payer.pubkey()),
        &signers,
        recent_hash,
    );
    if dry_run {
        let result = simulate_transaction(rpc_client, &txn, true, CommitmentConfig::confirmed())?;
        if let Some(err) = result.err {
            println!("simulation failed: {:?}", err);
        }
        let logs = result.logs.unwrap_or_default();
        let entries = parse_program_logs(&logs, &config.epoch_pool_program.to_string())?;
        print_program_logs(&entries);
        return Ok(());
    }
    let signature = send_txn(rpc_client, &txn, true)?;
    println!("{}", signature);
    Ok(())
}

fn main() -> Result<()> {
    let client_config = "client_config.ini";
    let pool_config = load_cfg(client_config)?;
    // cluster params.
    let payer = read_keypair_file(&pool_config.payer_path)?;
    // solana rpc client
    let rpc_client = RpcClient::new(pool_config.http_url.to_string());
    let program_id = pool_config.epoch_pool_program;

    let opts = Opts::parse();
    let dry_run = opts.dry_run;
    match opts.command {
        EpochPoolCommands::InitialisePool {
            asset_mint,
            fee_vault,
            forwarder,
            fee_rate,
            mining_program,
            miner_position,
            mining_stake_vault,
            bonus_program,
            receipt_tag,
            min_receipt_len,
            max_receipt_len,
        } => {
            let mint = get_mint_info(&rpc_client, &asset_mint)?;
            let params = PoolParams {
                forwarder,
                fee_rate,
                mining_program,
                miner_position,
                mining_stake_vault,
                bonus_program,
                receipt_tag: parse_receipt_tag(&receipt_tag)?,
                min_receipt_len,
                max_receipt_len,
            };
            let instructions = initialise_pool_instr(&pool_config, &mint, fee_vault, params)?;
            process_instructions(&rpc_client, &pool_config, &payer, &[], &instructions, dry_run)?;
        }
        EpochPoolCommands::OpenOwnerLedger {} => {
            let instructions = open_owner_ledger_instr(&pool_config)?;
            process_instructions(&rpc_client, &pool_config, &payer, &[], &instructions, dry_run)?;
        }
        EpochPoolCommands::Checkpoint {} => {
            let pool = fetch_pool(&rpc_client, &program_id)?;
            let instructions = checkpoint_instr(&pool_config, &pool.config)?;
            process_instructions(&rpc_client, &pool_config, &payer, &[], &instructions, dry_run)?;
        }
        EpochPoolCommands::Deposit {
            amount,
            owner_token,
        } => {
            let pool = fetch_pool(&rpc_client, &program_id)?;
            let mint = get_mint_info(&rpc_client, &pool.config.asset_mint)?;
            let mut instructions = Vec::new();
            if fetch_owner_ledger(&rpc_client, &program_id, &payer.pubkey())?.is_none() {
                instructions.extend(open_owner_ledger_instr(&pool_config)?);
            }
            instructions.extend(deposit_instr(
                &pool_config,
                &pool.config,
                &mint,
                owner_token,
                amount,
            )?);
            process_instructions(&rpc_client, &pool_config, &payer, &[], &instructions, dry_run)?;
        }
        EpochPoolCommands::WithdrawPrincipal {
            amount,
            recipient_token,
        } => {
            let pool = fetch_pool(&rpc_client, &program_id)?;
            let mint = get_mint_info(&rpc_client, &pool.config.asset_mint)?;
            let instructions = withdraw_principal_instr(
                &pool_config,
                &pool.config,
                &mint,
                recipient_token,
                amount,
            )?;
            process_instructions(&rpc_client, &pool_config, &payer, &[], &instructions, dry_run)?;
        }
        EpochPoolCommands::SubmitReceipt {
            payload,
            miner_credits,
            extra_accounts,
        } => {
            let forwarder = read_keypair_file(&pool_config.forwarder_path)?;
            let pool = fetch_pool(&rpc_client, &program_id)?;
            let payload = hex::decode(payload.trim_start_matches("0x"))?;
            let instructions = submit_receipt_instr(
                &pool_config,
                &pool.config,
                forwarder.pubkey(),
                miner_credits,
                &extra_accounts,
                payload,
            )?;
            process_instructions(
                &rpc_client,
                &pool_config,
                &payer,
                &[&forwarder],
                &instructions,
                dry_run,
            )?;
        }
        EpochPoolCommands::ClaimRegular {
            epochs,
            extra_accounts,
        } => {
            let pool = fetch_pool(&rpc_client, &program_id)?;
            let mint = get_mint_info(&rpc_client, &pool.config.asset_mint)?;
            let instructions =
                claim_regular_instr(&pool_config, &pool.config, &mint, epochs, &extra_accounts)?;
            process_instructions(&rpc_client, &pool_config, &payer, &[], &instructions, dry_run)?;
        }
        EpochPoolCommands::ClaimBonus {
            epochs,
            bonus_flags,
            extra_accounts,
        } => {
            if bonus_flags.len() != epochs.len() {
                return Err(format_err!(
                    "expected {} bonus flag accounts, got {}",
                    epochs.len(),
                    bonus_flags.len()
                ));
            }
            let pool = fetch_pool(&rpc_client, &program_id)?;
            let mint = get_mint_info(&rpc_client, &pool.config.asset_mint)?;
            let instructions = claim_bonus_instr(
                &pool_config,
                &pool.config,
                &mint,
                epochs,
                &bonus_flags,
                &extra_accounts,
            )?;
            process_instructions(&rpc_client, &pool_config, &payer, &[], &instructions, dry_run)?;
        }
        EpochPoolCommands::ClaimOwner {
            epochs,
            recipient_token,
        } => {
            let pool = fetch_pool(&rpc_client, &program_id)?;
            let mint = get_mint_info(&rpc_client, &pool.config.asset_mint)?;
            let instructions =
                claim_owner_instr(&pool_config, &pool.config, &mint, recipient_token, epochs)?;
            process_instructions(&rpc_client, &pool_config, &payer, &[], &instructions, dry_run)?;
        }
        EpochPoolCommands::UnstakeAtEpochEnd {} => {
            let pool = fetch_pool(&rpc_client, &program_id)?;
            let instructions = unstake_at_epoch_end_instr(&pool_config, &pool.config)?;
            process_instructions(&rpc_client, &pool_config, &payer, &[], &instructions, dry_run)?;
        }
        EpochPoolCommands::FinalizeWithdraw {} => {
            let pool = fetch_pool(&rpc_client, &program_id)?;
            let mint = get_mint_info(&rpc_client, &pool.config.asset_mint)?;
            let instructions = finalize_withdraw_instr(&pool_config, &pool.config, &mint)?;
            process_instructions(&rpc_client, &pool_config, &payer, &[], &instructions, dry_run)?;
        }
        EpochPoolCommands::Restake {} => {
            let pool = fetch_pool(&rpc_client, &program_id)?;
            let mint = get_mint_info(&rpc_client, &pool.config.asset_mint)?;
            let instructions = restake_instr(&pool_config, &pool.config, &mint)?;
            process_instructions(&rpc_client, &pool_config, &payer, &[], &instructions, dry_run)?;
        }
        EpochPoolCommands::StakePrincipal {} => {
            let pool = fetch_pool(&rpc_client, &program_id)?;
            let mint = get_mint_info(&rpc_client, &pool.config.asset_mint)?;
            let instructions = stake_principal_instr(&pool_config, &pool.config, &mint)?;
            process_instructions(&rpc_client, &pool_config, &payer, &[], &instructions, dry_run)?;
        }
        EpochPoolCommands::ShowPool { epochs } => {
            let pool = fetch_pool(&rpc_client, &program_id)?;
            let current = rpc_client.get_epoch_info()?.epoch;
            let info = &pool.info;
            let ledger = &pool.ledger;
            let epoch_views: Vec<_> = epochs
                .iter()
                .map(|&epoch| {
                    let record = ledger.epoch_record(epoch);
                    json!({
                        "epoch": epoch,
                        "total_shares": ledger.total_shares_at(epoch),
                        "scheduled_activation": ledger.scheduled_activation(epoch),
                        "credits_total": record.map(|r| r.credits_total).unwrap_or(0),
                        "acc_credits_per_share": record
                            .map(|r| r.acc_credits_per_share)
                            .unwrap_or(0)
                            .to_string(),
                        "acc_reward_per_share": record
                            .map(|r| r.acc_reward_per_share)
                            .unwrap_or(0)
                            .to_string(),
                        "regular_gross": record.map(|r| r.regular_gross).unwrap_or(0),
                        "bonus_gross": record.map(|r| r.bonus_gross).unwrap_or(0),
                        "net_rewards": record.map(|r| r.net_rewards).unwrap_or(0),
                        "regular_claimed": record.map(|r| r.regular_claimed).unwrap_or(false),
                        "bonus_claimed": record.map(|r| r.bonus_claimed).unwrap_or(false),
                    })
                })
                .collect();
            let view = json!({
                "current_epoch": current,
                "phase": format!("{:?}", info.phase),
                "genesis_epoch": info.genesis_epoch,
                "last_settled_epoch": info.last_settled_epoch,
                "unstake_not_before_epoch": info.unstake_not_before_epoch,
                "last_restake_epoch": info.last_restake_epoch,
                "active_total_shares": info.active_total_shares,
                "total_shares_now": ledger.total_shares_at(current),
                "total_liability": info.total_liability,
                "total_rewards_accrued": info.total_rewards_accrued,
                "total_rewards_paid": info.total_rewards_paid,
                "reward_reserve": info.reward_reserve()?,
                "total_fees_paid": info.total_fees_paid,
                "total_credits": info.total_credits,
                "fee_rate": pool.config.fee_rate,
                "forwarder": pool.config.forwarder.to_string(),
                "scheduled": ledger
                    .scheduled
                    .iter()
                    .map(|s| json!({ "epoch": s.epoch, "amount": s.amount }))
                    .collect::<Vec<_>>(),
                "epochs": epoch_views,
            });
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        EpochPoolCommands::ShowOwner { owner, epochs } => {
            let owner = owner.unwrap_or_else(|| payer.pubkey());
            let pool = fetch_pool(&rpc_client, &program_id)?;
            let ledger = fetch_owner_ledger(&rpc_client, &program_id, &owner)?
                .ok_or_else(|| format_err!("owner {} has no ledger", owner))?;
            let current = rpc_client.get_epoch_info()?.epoch;
            let payouts = rewards::preview_owner_claim(&pool.ledger, &ledger, &epochs)?;
            let mut epoch_views = Vec::with_capacity(epochs.len());
            for payout in &payouts {
                epoch_views.push(json!({
                    "epoch": payout.epoch,
                    "shares": ledger.shares_at(payout.epoch),
                    "credits": credits::owner_credits(&pool.ledger, &ledger, payout.epoch)?,
                    "rewards_accumulated": payout.accumulated,
                    "rewards_payable": payout.payable,
                }));
            }
            let view = json!({
                "owner": owner.to_string(),
                "current_epoch": current,
                "deposited": ledger.deposited,
                "withdrawn": ledger.withdrawn,
                "liability": ledger.liability()?,
                "rewards_claimed": ledger.rewards_claimed,
                "shares_now": ledger.shares_at(current),
                "shares_next_epoch": ledger.shares_at(current.saturating_add(1)),
                "epochs": epoch_views,
            });
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        EpochPoolCommands::DecodeTxn { signature } => {
            let signature = Signature::from_str(&signature)?;
            let logs = get_transaction_logs(&rpc_client, &signature)?;
            let entries = parse_program_logs(&logs, &program_id.to_string())?;
            print_program_logs(&entries);
        }
    }
    Ok(())
}
