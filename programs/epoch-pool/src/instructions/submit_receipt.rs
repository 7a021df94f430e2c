use crate::error::ErrorCode;
use crate::instructions::settle_to_current;
use crate::ledger::credits;
use crate::mining_cpi;
use crate::states::*;
use crate::AUTH_SEED;
use anchor_lang::prelude::*;

/// Accounts for `submit_receipt`.
///
/// Remaining accounts are appended, in order, to the forwarded backend call.
#[derive(Accounts)]
pub struct SubmitReceipt<'info> {
    /// The configured forwarder; pays for pool ledger growth.
    #[account(
        mut,
        constraint = forwarder.key() == global_config.forwarder @ ErrorCode::UnauthorizedForwarder
    )]
    pub forwarder: Signer<'info>,

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
        realloc::payer = forwarder,
        realloc::zero = false,
    )]
    pub pool_ledger: Box<Account<'info, PoolLedger>>,

    /// CHECK: PDA derivation enforced by seeds; signs the forwarded call.
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

    /// CHECK: Pool position in the mining backend, pinned by config.
    #[account(
        mut,
        address = global_config.miner_position @ ErrorCode::InvalidMiningAccount
    )]
    pub miner_position: UncheckedAccount<'info>,

    /// Credit counter for the current epoch; may not exist before the first forward.
    ///
    /// CHECK: Owner, authority and epoch are verified when read.
    #[account(mut)]
    pub miner_credits: UncheckedAccount<'info>,

    pub system_program: Program<'info, System>,
}

/// Forwards a receipt to the mining backend and records the credit delta.
///
/// Steps:
/// 1) Settle; require the active phase and at least one active share.
/// 2) Validate payload length and tag.
/// 3) Read the pool's credit counter, forward, read it again.
/// 4) Spread the delta over the shares active now.
///
/// A backend that fails aborts the whole transaction with its own error code;
/// the runtime does not hand that failure back to this program. Only errors
/// raised before the backend runs, such as account privilege checks on the
/// invoke, are mapped to `ForwardCallFailed`.
pub fn submit_receipt<'info>(
    ctx: Context<'_, '_, 'info, 'info, SubmitReceipt<'info>>,
    payload: Vec<u8>,
) -> Result<()> {
    // --- 1) Settle and gate ---
    let current = settle_to_current(&mut ctx.accounts.pool_info, &mut ctx.accounts.pool_ledger)?;
    credits::ensure_forwardable(&ctx.accounts.pool_info)?;

    // --- 2) Payload ---
    ctx.accounts.global_config.check_receipt(&payload)?;

    // --- 3) Forward ---
    let mining_program = ctx.accounts.global_config.mining_program;
    let authority = ctx.accounts.authority.key();
    let credits_before = MinerCredits::read(
        &ctx.accounts.miner_credits.to_account_info(),
        &mining_program,
        &authority,
        current,
    )?;

    let mut accounts = vec![
        ctx.accounts.miner_position.to_account_info(),
        ctx.accounts.miner_credits.to_account_info(),
    ];
    accounts.extend_from_slice(ctx.remaining_accounts);
    mining_cpi::forward(
        &ctx.accounts.mining_program.to_account_info(),
        &ctx.accounts.authority.to_account_info(),
        &accounts,
        payload,
        &[&[AUTH_SEED.as_bytes(), &[ctx.accounts.global_config.authority_bump]]],
    )
    .map_err(|err| {
        msg!("Forward failed: {}", err);
        error!(ErrorCode::ForwardCallFailed)
    })?;

    let credits_after = MinerCredits::read(
        &ctx.accounts.miner_credits.to_account_info(),
        &mining_program,
        &authority,
        current,
    )?;

    // --- 4) Credit index ---
    let outcome = credits::record_forward(
        &mut ctx.accounts.pool_info,
        &mut ctx.accounts.pool_ledger,
        current,
        credits_before,
        credits_after,
    )?;

    emit!(ReceiptForwarded {
        epoch: current,
        credits_delta: outcome.credits_delta,
        active_total_shares: ctx.accounts.pool_info.active_total_shares,
        acc_credits_per_share: outcome.acc_credits_per_share,
    });
    Ok(())
}
