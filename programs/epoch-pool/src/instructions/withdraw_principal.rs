use crate::error::ErrorCode;
use crate::instructions::settle_to_current;
use crate::ledger::{activation, lifecycle};
use crate::states::*;
use crate::utils::transfer_from_pool_vault_to_user;
use crate::AUTH_SEED;
use anchor_lang::prelude::*;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

#[derive(Accounts)]
pub struct WithdrawPrincipal<'info> {
    #[account(mut)]
    pub owner: Signer<'info>,

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
        realloc::payer = owner,
        realloc::zero = false,
    )]
    pub pool_ledger: Box<Account<'info, PoolLedger>>,

    #[account(
        mut,
        seeds = [
            OWNER_LEDGER_SEED.as_bytes(),
            owner.key().as_ref()
        ],
        bump = owner_ledger.bump,
        realloc = owner_ledger.space_with_headroom(),
        realloc::payer = owner,
        realloc::zero = false,
    )]
    pub owner_ledger: Box<Account<'info, OwnerLedger>>,

    /// Pool authority PDA (token authority of custody).
    ///
    /// CHECK: PDA derivation enforced by seeds; used only as a signer.
    #[account(
        seeds = [AUTH_SEED.as_bytes()],
        bump = global_config.authority_bump,
    )]
    pub authority: UncheckedAccount<'info>,

    #[account(address = global_config.asset_mint @ ErrorCode::InvalidMint)]
    pub asset_mint: Box<InterfaceAccount<'info, Mint>>,

    #[account(mut, address = global_config.custody_vault)]
    pub custody_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    /// Any token account of the pooled asset.
    #[account(
        mut,
        token::mint = asset_mint,
    )]
    pub recipient_token: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,

    pub system_program: Program<'info, System>,
}

/// Withdraws `amount` of the caller's principal to `recipient_token`.
///
/// Allowed in every phase, bounded by what custody holds beyond the reward
/// reserve. Queued principal is released before active shares.
pub fn withdraw_principal(ctx: Context<WithdrawPrincipal>, amount: u64) -> Result<()> {
    let current = settle_to_current(&mut ctx.accounts.pool_info, &mut ctx.accounts.pool_ledger)?;

    // --- Liquidity net of the reward reserve ---
    let liquidity =
        lifecycle::withdrawable_liquidity(&ctx.accounts.pool_info, ctx.accounts.custody_vault.amount)?;
    require!(amount <= liquidity, ErrorCode::InsufficientLiquidity);

    let split = activation::withdraw_principal(
        &mut ctx.accounts.pool_info,
        &mut ctx.accounts.pool_ledger,
        &mut ctx.accounts.owner_ledger,
        current,
        amount,
    )?;

    transfer_from_pool_vault_to_user(
        ctx.accounts.authority.to_account_info(),
        ctx.accounts.custody_vault.to_account_info(),
        ctx.accounts.recipient_token.to_account_info(),
        ctx.accounts.asset_mint.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        amount,
        ctx.accounts.asset_mint.decimals,
        &[&[AUTH_SEED.as_bytes(), &[ctx.accounts.global_config.authority_bump]]],
    )?;

    emit!(PrincipalWithdrawn {
        owner: ctx.accounts.owner.key(),
        recipient: ctx.accounts.recipient_token.key(),
        amount,
        from_pending: split.from_pending,
        from_active: split.from_active,
    });
    Ok(())
}
