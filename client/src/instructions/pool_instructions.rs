use anchor_client::{Client, Cluster, Program};
use anchor_lang::prelude::AccountMeta;
use anyhow::Result;
use epoch_pool::accounts as epoch_pool_accounts;
use epoch_pool::instruction as epoch_pool_instructions;
use epoch_pool::states::GlobalConfig;
use solana_sdk::{instruction::Instruction, pubkey::Pubkey, signature::Keypair, system_program};
use std::rc::Rc;

use crate::instructions::utils::{
    get_associated_token_address, get_authority_address, get_custody_vault_address,
    get_global_config_address, get_owner_ledger_address, get_pool_info_address,
    get_pool_ledger_address, MintInfo,
};

use super::super::{read_keypair_file, ClientConfig};

fn load_program(config: &ClientConfig) -> Result<Program<Rc<Keypair>>> {
    let payer = read_keypair_file(&config.payer_path)?;
    let url = Cluster::Custom(config.http_url.clone(), config.ws_url.clone());
    let client = Client::new(url, Rc::new(payer));
    Ok(client.program(config.epoch_pool_program)?)
}

/// Parameters recorded in `GlobalConfig` at pool creation.
#[derive(Debug, Clone)]
pub struct PoolParams {
    pub forwarder: Pubkey,
    pub fee_rate: u64,
    pub mining_program: Pubkey,
    pub miner_position: Pubkey,
    pub mining_stake_vault: Pubkey,
    pub bonus_program: Pubkey,
    pub receipt_tag: [u8; 8],
    pub min_receipt_len: u16,
    pub max_receipt_len: u16,
}

pub fn initialise_pool_instr(
    config: &ClientConfig,
    mint: &MintInfo,
    fee_vault: Pubkey,
    params: PoolParams,
) -> Result<Vec<Instruction>> {
    let program = load_program(config)?;
    let instructions = program
        .request()
        .accounts(epoch_pool_accounts::InitialisePool {
            deployer: program.payer(),
            authority: get_authority_address(&program.id()),
            global_config: get_global_config_address(&program.id()),
            pool_info: get_pool_info_address(&program.id()),
            pool_ledger: get_pool_ledger_address(&program.id()),
            asset_mint: mint.mint,
            custody_vault: get_custody_vault_address(&program.id()),
            fee_vault,
            token_program: mint.token_program,
            system_program: system_program::id(),
        })
        .args(epoch_pool_instructions::InitialisePool {
            forwarder: params.forwarder,
            fee_rate: params.fee_rate,
            mining_program: params.mining_program,
            miner_position: params.miner_position,
            mining_stake_vault: params.mining_stake_vault,
            bonus_program: params.bonus_program,
            receipt_tag: params.receipt_tag,
            min_receipt_len: params.min_receipt_len,
            max_receipt_len: params.max_receipt_len,
        })
        .instructions()?;
    Ok(instructions)
}

pub fn open_owner_ledger_instr(config: &ClientConfig) -> Result<Vec<Instruction>> {
    let program = load_program(config)?;
    let instructions = program
        .request()
        .accounts(epoch_pool_accounts::OpenOwnerLedger {
            owner: program.payer(),
            owner_ledger: get_owner_ledger_address(&program.id(), &program.payer()),
            system_program: system_program::id(),
        })
        .args(epoch_pool_instructions::OpenOwnerLedger {})
        .instructions()?;
    Ok(instructions)
}

pub fn checkpoint_instr(config: &ClientConfig, pool: &GlobalConfig) -> Result<Vec<Instruction>> {
    let program = load_program(config)?;
    let instructions = program
        .request()
        .accounts(epoch_pool_accounts::Checkpoint {
            caller: program.payer(),
            global_config: get_global_config_address(&program.id()),
            pool_info: pool.pool_info,
            pool_ledger: pool.pool_ledger,
        })
        .args(epoch_pool_instructions::Checkpoint {})
        .instructions()?;
    Ok(instructions)
}

pub fn deposit_instr(
    config: &ClientConfig,
    pool: &GlobalConfig,
    mint: &MintInfo,
    owner_token: Option<Pubkey>,
    amount: u64,
) -> Result<Vec<Instruction>> {
    let program = load_program(config)?;
    let owner = program.payer();
    let instructions = program
        .request()
        .accounts(epoch_pool_accounts::Deposit {
            owner,
            global_config: get_global_config_address(&program.id()),
            pool_info: pool.pool_info,
            pool_ledger: pool.pool_ledger,
            owner_ledger: get_owner_ledger_address(&program.id(), &owner),
            asset_mint: pool.asset_mint,
            owner_token: owner_token.unwrap_or_else(|| get_associated_token_address(&owner, mint)),
            custody_vault: pool.custody_vault,
            token_program: mint.token_program,
            system_program: system_program::id(),
        })
        .args(epoch_pool_instructions::Deposit { amount })
        .instructions()?;
    Ok(instructions)
}

pub fn withdraw_principal_instr(
    config: &ClientConfig,
    pool: &GlobalConfig,
    mint: &MintInfo,
    recipient_token: Option<Pubkey>,
    amount: u64,
) -> Result<Vec<Instruction>> {
    let program = load_program(config)?;
    let owner = program.payer();
    let instructions = program
        .request()
        .accounts(epoch_pool_accounts::WithdrawPrincipal {
            owner,
            global_config: get_global_config_address(&program.id()),
            pool_info: pool.pool_info,
            pool_ledger: pool.pool_ledger,
            owner_ledger: get_owner_ledger_address(&program.id(), &owner),
            authority: get_authority_address(&program.id()),
            asset_mint: pool.asset_mint,
            custody_vault: pool.custody_vault,
            recipient_token: recipient_token
                .unwrap_or_else(|| get_associated_token_address(&owner, mint)),
            token_program: mint.token_program,
            system_program: system_program::id(),
        })
        .args(epoch_pool_instructions::WithdrawPrincipal { amount })
        .instructions()?;
    Ok(instructions)
}

/// `forwarder` signs; the payer only funds the transaction.
pub fn submit_receipt_instr(
    config: &ClientConfig,
    pool: &GlobalConfig,
    forwarder: Pubkey,
    miner_credits: Pubkey,
    extra_accounts: &[Pubkey],
    payload: Vec<u8>,
) -> Result<Vec<Instruction>> {
    let program = load_program(config)?;
    let mut instructions = program
        .request()
        .accounts(epoch_pool_accounts::SubmitReceipt {
            forwarder,
            global_config: get_global_config_address(&program.id()),
            pool_info: pool.pool_info,
            pool_ledger: pool.pool_ledger,
            authority: get_authority_address(&program.id()),
            mining_program: pool.mining_program,
            miner_position: pool.miner_position,
            miner_credits,
            system_program: system_program::id(),
        })
        .args(epoch_pool_instructions::SubmitReceipt { payload })
        .instructions()?;
    append_remaining(&mut instructions, extra_accounts.iter().map(|k| writable(*k)));
    Ok(instructions)
}

pub fn claim_regular_instr(
    config: &ClientConfig,
    pool: &GlobalConfig,
    mint: &MintInfo,
    epochs: Vec<u64>,
    extra_accounts: &[Pubkey],
) -> Result<Vec<Instruction>> {
    let program = load_program(config)?;
    let mut instructions = program
        .request()
        .accounts(claim_stream_accounts(&program, pool, mint, pool.mining_program))
        .args(epoch_pool_instructions::ClaimRegular { epochs })
        .instructions()?;
    append_remaining(&mut instructions, extra_accounts.iter().map(|k| writable(*k)));
    Ok(instructions)
}

/// `bonus_flags` must hold one flag account per epoch, in epoch order.
pub fn claim_bonus_instr(
    config: &ClientConfig,
    pool: &GlobalConfig,
    mint: &MintInfo,
    epochs: Vec<u64>,
    bonus_flags: &[Pubkey],
    extra_accounts: &[Pubkey],
) -> Result<Vec<Instruction>> {
    let program = load_program(config)?;
    let mut instructions = program
        .request()
        .accounts(claim_stream_accounts(&program, pool, mint, pool.bonus_program))
        .args(epoch_pool_instructions::ClaimBonus { epochs })
        .instructions()?;
    append_remaining(
        &mut instructions,
        bonus_flags
            .iter()
            .map(|k| AccountMeta::new_readonly(*k, false))
            .chain(extra_accounts.iter().map(|k| writable(*k))),
    );
    Ok(instructions)
}

pub fn claim_owner_instr(
    config: &ClientConfig,
    pool: &GlobalConfig,
    mint: &MintInfo,
    recipient_token: Option<Pubkey>,
    epochs: Vec<u64>,
) -> Result<Vec<Instruction>> {
    let program = load_program(config)?;
    let owner = program.payer();
    let instructions = program
        .request()
        .accounts(epoch_pool_accounts::ClaimOwner {
            owner,
            global_config: get_global_config_address(&program.id()),
            pool_info: pool.pool_info,
            pool_ledger: pool.pool_ledger,
            owner_ledger: get_owner_ledger_address(&program.id(), &owner),
            authority: get_authority_address(&program.id()),
            asset_mint: pool.asset_mint,
            custody_vault: pool.custody_vault,
            recipient_token: recipient_token
                .unwrap_or_else(|| get_associated_token_address(&owner, mint)),
            token_program: mint.token_program,
            system_program: system_program::id(),
        })
        .args(epoch_pool_instructions::ClaimOwner { epochs })
        .instructions()?;
    Ok(instructions)
}

pub fn unstake_at_epoch_end_instr(
    config: &ClientConfig,
    pool: &GlobalConfig,
) -> Result<Vec<Instruction>> {
    let program = load_program(config)?;
    let instructions = program
        .request()
        .accounts(epoch_pool_accounts::UnstakeAtEpochEnd {
            caller: program.payer(),
            global_config: get_global_config_address(&program.id()),
            pool_info: pool.pool_info,
            pool_ledger: pool.pool_ledger,
            authority: get_authority_address(&program.id()),
            mining_program: pool.mining_program,
            miner_position: pool.miner_position,
        })
        .args(epoch_pool_instructions::UnstakeAtEpochEnd {})
        .instructions()?;
    Ok(instructions)
}

pub fn finalize_withdraw_instr(
    config: &ClientConfig,
    pool: &GlobalConfig,
    mint: &MintInfo,
) -> Result<Vec<Instruction>> {
    let program = load_program(config)?;
    let instructions = program
        .request()
        .accounts(epoch_pool_accounts::FinalizeWithdraw {
            caller: program.payer(),
            global_config: get_global_config_address(&program.id()),
            pool_info: pool.pool_info,
            pool_ledger: pool.pool_ledger,
            authority: get_authority_address(&program.id()),
            mining_program: pool.mining_program,
            miner_position: pool.miner_position,
            mining_stake_vault: pool.mining_stake_vault,
            asset_mint: pool.asset_mint,
            custody_vault: pool.custody_vault,
            token_program: mint.token_program,
        })
        .args(epoch_pool_instructions::FinalizeWithdraw {})
        .instructions()?;
    Ok(instructions)
}

pub fn restake_instr(
    config: &ClientConfig,
    pool: &GlobalConfig,
    mint: &MintInfo,
) -> Result<Vec<Instruction>> {
    let program = load_program(config)?;
    let instructions = program
        .request()
        .accounts(stake_shortfall_accounts(&program, pool, mint))
        .args(epoch_pool_instructions::Restake {})
        .instructions()?;
    Ok(instructions)
}

pub fn stake_principal_instr(
    config: &ClientConfig,
    pool: &GlobalConfig,
    mint: &MintInfo,
) -> Result<Vec<Instruction>> {
    let program = load_program(config)?;
    let instructions = program
        .request()
        .accounts(stake_shortfall_accounts(&program, pool, mint))
        .args(epoch_pool_instructions::StakePrincipal {})
        .instructions()?;
    Ok(instructions)
}

fn claim_stream_accounts(
    program: &Program<Rc<Keypair>>,
    pool: &GlobalConfig,
    mint: &MintInfo,
    backend_program: Pubkey,
) -> epoch_pool_accounts::ClaimStream {
    epoch_pool_accounts::ClaimStream {
        payer: program.payer(),
        global_config: get_global_config_address(&program.id()),
        pool_info: pool.pool_info,
        pool_ledger: pool.pool_ledger,
        authority: get_authority_address(&program.id()),
        backend_program,
        miner_position: pool.miner_position,
        asset_mint: pool.asset_mint,
        custody_vault: pool.custody_vault,
        fee_vault: pool.fee_vault,
        token_program: mint.token_program,
        system_program: system_program::id(),
    }
}

fn stake_shortfall_accounts(
    program: &Program<Rc<Keypair>>,
    pool: &GlobalConfig,
    mint: &MintInfo,
) -> epoch_pool_accounts::StakeShortfall {
    epoch_pool_accounts::StakeShortfall {
        caller: program.payer(),
        global_config: get_global_config_address(&program.id()),
        pool_info: pool.pool_info,
        pool_ledger: pool.pool_ledger,
        authority: get_authority_address(&program.id()),
        mining_program: pool.mining_program,
        miner_position: pool.miner_position,
        mining_stake_vault: pool.mining_stake_vault,
        asset_mint: pool.asset_mint,
        custody_vault: pool.custody_vault,
        token_program: mint.token_program,
    }
}

fn writable(key: Pubkey) -> AccountMeta {
    AccountMeta::new(key, false)
}

/// Backend-specific accounts ride along as remaining accounts.
fn append_remaining(instructions: &mut [Instruction], metas: impl Iterator<Item = AccountMeta>) {
    if let Some(ix) = instructions.first_mut() {
        ix.accounts.extend(metas);
    }
}
