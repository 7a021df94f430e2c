use crate::error::ErrorCode;
use crate::instructions::settle_to_current;
use crate::ledger::lifecycle;
use crate::mining_cpi;
use crate::states::*;
use crate::AUTH_SEED;
use anchor_lang::prelude::*;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

/// Accounts for the permissionless `finalize_withdraw`.
#[derive(Accounts)]
pub struct FinalizeWithdraw<'info> {
    pub caller: Signer<'info>,

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
    )]
    pub pool_ledger: Box<Account<'info, PoolLedger>>,

    /// CHECK: PDA derivation enforced by seeds; signs the backend call.
    #[account(
        seeds = [AUTH_SEED.as_bytes()],
        bump = global_config.authority_bump,
    )]
    pub authority: UncheckedAccount<'info>,

    /// CHECK: Mining backend program (CPI target), pinned by config.
    #[account(
        executable,
        address = global_config.mining_program @ ErrorCode::InvalidMiningAccount
    )]
    pub mining_program: UncheckedAccount<'info>,

    /// CHECK: Owner and authority verified when deserialized.
    #[account(
        mut,
        address = global_config.miner_position @ ErrorCode::InvalidMiningAccount
    )]
    pub miner_position: UncheckedAccount<'info>,

    /// CHECK: Backend vault holding staked principal, pinned by config.
    #[account(
        mut,
        address = global_config.mining_stake_vault @ ErrorCode::InvalidMiningAccount
    )]
    pub mining_stake_vault: UncheckedAccount<'info>,

    #[account(address = global_config.asset_mint @ ErrorCode::InvalidMint)]
    pub asset_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut, address = global_config.custody_vault)]
    pub custody_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,
}

/// `Cooldown -> WithdrawnIdle`: pulls the unstaked principal back into custody
/// once the backend cooldown has elapsed.
pub fn finalize_withdraw(ctx: Context<FinalizeWithdraw>) -> Result<()> {
    settle_to_current(&mut ctx.accounts.pool_info, &mut ctx.accounts.pool_ledger)?;

    let position = MinerPosition::load(
        &ctx.accounts.miner_position.to_account_info(),
        &ctx.accounts.global_config.mining_program,
        &ctx.accounts.authority.key(),
    )?;
    let now = Clock::get()?.unix_timestamp;
    lifecycle::finalize_withdraw(&mut ctx.accounts.pool_info, now, position.withdrawable_at)?;

    let balance_before = ctx.accounts.custody_vault.amount;
    mining_cpi::withdraw(
        &ctx.accounts.mining_program.to_account_info(),
        &ctx.accounts.authority.to_account_info(),
        &[
            ctx.accounts.miner_position.to_account_info(),
            ctx.accounts.mining_stake_vault.to_account_info(),
            ctx.accounts.custody_vault.to_account_info(),
            ctx.accounts.asset_mint.to_account_info(),
            ctx.accounts.token_program.to_account_info(),
        ],
        &[&[AUTH_SEED.as_bytes(), &[ctx.accounts.global_config.authority_bump]]],
    )?;
    ctx.accounts.custody_vault.reload()?;
    let withdrawn = ctx
        .accounts
        .custody_vault
        .amount
        .saturating_sub(balance_before);
    msg!("Withdrawn {} from the mining backend", withdrawn);

    emit!(WithdrawFinalized {
        withdrawn,
        timestamp: now,
    });
    Ok(())
}
