use crate::error::ErrorCode;
use crate::instructions::settle_to_current;
use crate::ledger::rewards::{self, RewardStream};
use crate::mining_cpi;
use crate::states::*;
use crate::utils::transfer_from_pool_vault_to_user;
use crate::AUTH_SEED;
use anchor_lang::prelude::*;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

/// Accounts shared by `claim_regular` and `claim_bonus`.
///
/// `backend_program` is the mining backend for regular claims and the bonus
/// backend for bonus claims. For bonus claims the first `epochs.len()`
/// remaining accounts are the `BonusEpoch` flag accounts, one per epoch in the
/// same order; every other remaining account is passed through to the backend.
#[derive(Accounts)]
pub struct ClaimStream<'info> {
    /// Permissionless caller; pays for pool ledger growth.
    #[account(mut)]
    pub payer: Signer<'info>,

    #[account(
        seeds = [GLOBAL_CONFIG_SEED.as_bytes()],
        bump = global_config.bump,
    )]
    pub global_config: Box<Account<'info, GlobalConfig>>,

    #[account(
        mut,
        address = global_config.pool_info,
    )]
    pub pool_info: Box<Account<'info, PoolInfo>>,

    #[account(
        mut,
        address = global_config.pool_ledger,
        realloc = pool_ledger.space_with_headroom(),
        realloc::payer = payer,
        realloc::zero = false,
    )]
    pub pool_ledger: Box<Account<'info, PoolLedger>>,

    /// CHECK: PDA derivation enforced by seeds; signs backend calls and fee transfers.
    #[account(
        seeds = [AUTH_SEED.as_bytes()],
        bump = global_config.authority_bump,
    )]
    pub authority: UncheckedAccount<'info>,

    /// CHECK: Checked against the configured backend for the stream in the handler.
    #[account(executable)]
    pub backend_program: UncheckedAccount<'info>,

    /// CHECK: Pool position in the mining backend, pinned by config.
    #[account(address = global_config.miner_position @ ErrorCode::InvalidMiningAccount)]
    pub miner_position: UncheckedAccount<'info>,

    #[account(address = global_config.asset_mint @ ErrorCode::InvalidMint)]
    pub asset_mint: Box<InterfaceAccount<'info, Mint>>,

    /// Receives the claimed rewards; the balance delta is the gross inflow.
    #[account(mut, address = global_config.custody_vault)]
    pub custody_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(mut, address = global_config.fee_vault)]
    pub fee_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,

    pub system_program: Program<'info, System>,
}

/// Claims the regular stream for `epochs` from the mining backend.
pub fn claim_regular<'info>(
    ctx: Context<'_, '_, 'info, 'info, ClaimStream<'info>>,
    epochs: Vec<u64>,
) -> Result<()> {
    require_keys_eq!(
        ctx.accounts.backend_program.key(),
        ctx.accounts.global_config.mining_program,
        ErrorCode::InvalidMiningAccount
    );
    let current = settle_to_current(&mut ctx.accounts.pool_info, &mut ctx.accounts.pool_ledger)?;

    rewards::validate_epochs(&epochs, current)?;
    for &epoch in &epochs {
        rewards::ensure_unclaimed(&ctx.accounts.pool_ledger, RewardStream::Regular, epoch)?;
    }

    let mut passthrough = vec![
        ctx.accounts.miner_position.to_account_info(),
        ctx.accounts.custody_vault.to_account_info(),
    ];
    passthrough.extend_from_slice(ctx.remaining_accounts);

    settle_stream(ctx.accounts, RewardStream::Regular, &epochs, &passthrough)
}

/// Claims the bonus stream for `epochs` from the bonus backend. Every epoch
/// must be flagged as a bonus epoch with claims open.
pub fn claim_bonus<'info>(
    ctx: Context<'_, '_, 'info, 'info, ClaimStream<'info>>,
    epochs: Vec<u64>,
) -> Result<()> {
    require_keys_eq!(
        ctx.accounts.backend_program.key(),
        ctx.accounts.global_config.bonus_program,
        ErrorCode::InvalidBonusAccount
    );
    let current = settle_to_current(&mut ctx.accounts.pool_info, &mut ctx.accounts.pool_ledger)?;

    rewards::validate_epochs(&epochs, current)?;
    require!(
        ctx.remaining_accounts.len() >= epochs.len(),
        ErrorCode::MissingRemainingAccount
    );
    let (flag_accounts, rest) = ctx.remaining_accounts.split_at(epochs.len());
    let bonus_program = ctx.accounts.global_config.bonus_program;
    for (&epoch, flags) in epochs.iter().zip(flag_accounts) {
        rewards::ensure_unclaimed(&ctx.accounts.pool_ledger, RewardStream::Bonus, epoch)?;
        let flags = BonusEpoch::load(flags, &bonus_program, epoch)?;
        rewards::ensure_bonus_eligible(&flags)?;
    }

    let mut passthrough = vec![ctx.accounts.custody_vault.to_account_info()];
    passthrough.extend_from_slice(flag_accounts);
    passthrough.extend_from_slice(rest);

    settle_stream(ctx.accounts, RewardStream::Bonus, &epochs, &passthrough)
}

/// Claims each epoch separately so every gross inflow is attributed to exactly
/// one epoch, then sends the accumulated fee to the fee vault in one transfer.
fn settle_stream<'info>(
    accounts: &mut ClaimStream<'info>,
    stream: RewardStream,
    epochs: &[u64],
    passthrough: &[AccountInfo<'info>],
) -> Result<()> {
    let program = accounts.backend_program.to_account_info();
    let authority = accounts.authority.to_account_info();
    let bump = accounts.global_config.authority_bump;
    let signer_seeds: &[&[&[u8]]] = &[&[AUTH_SEED.as_bytes(), &[bump]]];
    let fee_rate = accounts.global_config.fee_rate;

    let mut total_fee: u64 = 0;
    for &epoch in epochs {
        let balance_before = accounts.custody_vault.amount;
        match stream {
            RewardStream::Regular => {
                mining_cpi::claim(&program, &authority, passthrough, vec![epoch], signer_seeds)?
            }
            RewardStream::Bonus => mining_cpi::claim_bonus(
                &program,
                &authority,
                passthrough,
                vec![epoch],
                signer_seeds,
            )?,
        }
        accounts.custody_vault.reload()?;
        let gross = accounts
            .custody_vault
            .amount
            .saturating_sub(balance_before);

        let inflow = rewards::record_inflow(
            &mut accounts.pool_info,
            &mut accounts.pool_ledger,
            stream,
            epoch,
            gross,
            fee_rate,
        )?;
        total_fee = total_fee
            .checked_add(inflow.fee)
            .ok_or(ErrorCode::MathOverflow)?;

        msg!(
            "Epoch {} {:?}: gross {}, fee {}, net {}",
            epoch,
            stream,
            inflow.gross,
            inflow.fee,
            inflow.net
        );
        emit!(RewardInflowRecorded {
            epoch,
            bonus: stream == RewardStream::Bonus,
            gross: inflow.gross,
            fee: inflow.fee,
            net: inflow.net,
            acc_reward_per_share: inflow.acc_reward_per_share,
        });
    }

    transfer_from_pool_vault_to_user(
        authority,
        accounts.custody_vault.to_account_info(),
        accounts.fee_vault.to_account_info(),
        accounts.asset_mint.to_account_info(),
        accounts.token_program.to_account_info(),
        total_fee,
        accounts.asset_mint.decimals,
        signer_seeds,
    )?;
    Ok(())
}
