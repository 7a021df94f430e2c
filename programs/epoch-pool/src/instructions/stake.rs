use crate::error::ErrorCode;
use crate::instructions::settle_to_current;
use crate::ledger::lifecycle;
use crate::mining_cpi;
use crate::states::*;
use crate::AUTH_SEED;
use anchor_lang::prelude::*;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

/// Accounts shared by `restake` and `stake_principal`. Both stake exactly the
/// shortfall between aggregate liability and the backend position.
#[derive(Accounts)]
pub struct StakeShortfall<'info> {
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

    /// CHECK: PDA derivation enforced by seeds; custody authority and backend signer.
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

    /// CHECK: Backend vault receiving staked principal, pinned by config.
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

impl<'info> StakeShortfall<'info> {
    fn staked_amount(&self) -> Result<u64> {
        let position = MinerPosition::load(
            &self.miner_position.to_account_info(),
            &self.global_config.mining_program,
            &self.authority.key(),
        )?;
        Ok(position.staked_amount)
    }

    fn stake(&self, amount: u64) -> Result<()> {
        mining_cpi::stake(
            &self.mining_program.to_account_info(),
            &self.authority.to_account_info(),
            &[
                self.miner_position.to_account_info(),
                self.custody_vault.to_account_info(),
                self.mining_stake_vault.to_account_info(),
                self.asset_mint.to_account_info(),
                self.token_program.to_account_info(),
            ],
            amount,
            &[&[AUTH_SEED.as_bytes(), &[self.global_config.authority_bump]]],
        )
    }
}

/// `WithdrawnIdle -> ActiveStaked`: stakes the shortfall (possibly zero), flips
/// the phase back and re-arms the unstake boundary at the next epoch.
pub fn restake(ctx: Context<StakeShortfall>) -> Result<()> {
    let current = settle_to_current(&mut ctx.accounts.pool_info, &mut ctx.accounts.pool_ledger)?;

    let staked = ctx.accounts.staked_amount()?;
    let amount = lifecycle::restake(
        &mut ctx.accounts.pool_info,
        staked,
        ctx.accounts.custody_vault.amount,
        current,
    )?;
    if amount > 0 {
        ctx.accounts.stake(amount)?;
    }
    msg!("Restaked {} at epoch {}", amount, current);

    emit!(PoolRestaked {
        epoch: current,
        amount,
        unstake_not_before_epoch: ctx.accounts.pool_info.unstake_not_before_epoch,
    });
    Ok(())
}

/// Stakes principal deposited since the last stake while the pool is active.
pub fn stake_principal(ctx: Context<StakeShortfall>) -> Result<()> {
    settle_to_current(&mut ctx.accounts.pool_info, &mut ctx.accounts.pool_ledger)?;

    let staked = ctx.accounts.staked_amount()?;
    let amount = lifecycle::stake_principal(
        &ctx.accounts.pool_info,
        staked,
        ctx.accounts.custody_vault.amount,
    )?;
    ctx.accounts.stake(amount)?;

    emit!(PrincipalStaked {
        amount,
        total_liability: ctx.accounts.pool_info.total_liability,
        reward_reserve: ctx.accounts.pool_info.reward_reserve()?,
    });
    Ok(())
}
