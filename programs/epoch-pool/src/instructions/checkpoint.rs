use crate::ledger::activation;
use crate::states::*;
use anchor_lang::prelude::*;

/// Accounts for the permissionless `checkpoint` instruction.
#[derive(Accounts)]
pub struct Checkpoint<'info> {
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
}

/// Lazy activation step run at the top of every state-changing instruction.
///
/// Reads the cluster epoch, applies the pending activation if the epoch moved
/// and returns the epoch the pool is now settled at.
pub fn settle_to_current(pool_info: &mut PoolInfo, pool_ledger: &mut PoolLedger) -> Result<u64> {
    let current = Clock::get()?.epoch;
    if let Some(settlement) = activation::settle(pool_info, pool_ledger, current)? {
        msg!(
            "Settled epoch {} -> {}, activated {}",
            settlement.from_epoch,
            settlement.to_epoch,
            settlement.activated
        );
        emit!(EpochSettled {
            from_epoch: settlement.from_epoch,
            to_epoch: settlement.to_epoch,
            activated: settlement.activated,
            active_total_shares: pool_info.active_total_shares,
        });
    }
    Ok(current)
}

/// Idempotent; safe to call at any time by anyone.
pub fn checkpoint(ctx: Context<Checkpoint>) -> Result<()> {
    settle_to_current(&mut ctx.accounts.pool_info, &mut ctx.accounts.pool_ledger)?;
    Ok(())
}
