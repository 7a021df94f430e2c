use crate::error::ErrorCode;
use crate::instructions::settle_to_current;
use crate::ledger::lifecycle;
use crate::mining_cpi;
use crate::states::*;
use crate::AUTH_SEED;
use anchor_lang::prelude::*;

/// Accounts for the permissionless `unstake_at_epoch_end`.
#[derive(Accounts)]
pub struct UnstakeAtEpochEnd<'info> {
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
}

/// `ActiveStaked -> Cooldown`: requests the backend unstake once the
/// not-before epoch is reached and something is staked.
pub fn unstake_at_epoch_end(ctx: Context<UnstakeAtEpochEnd>) -> Result<()> {
    let current = settle_to_current(&mut ctx.accounts.pool_info, &mut ctx.accounts.pool_ledger)?;

    let position = MinerPosition::load(
        &ctx.accounts.miner_position.to_account_info(),
        &ctx.accounts.global_config.mining_program,
        &ctx.accounts.authority.key(),
    )?;
    lifecycle::begin_unstake(&mut ctx.accounts.pool_info, position.staked_amount, current)?;

    mining_cpi::unstake(
        &ctx.accounts.mining_program.to_account_info(),
        &ctx.accounts.authority.to_account_info(),
        &[ctx.accounts.miner_position.to_account_info()],
        &[&[AUTH_SEED.as_bytes(), &[ctx.accounts.global_config.authority_bump]]],
    )?;
    msg!("Unstake requested at epoch {}", current);

    emit!(UnstakeRequested {
        epoch: current,
        staked_amount: position.staked_amount,
    });
    Ok(())
}
