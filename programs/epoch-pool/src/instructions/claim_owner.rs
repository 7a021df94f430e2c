use crate::error::ErrorCode;
use crate::instructions::settle_to_current;
use crate::ledger::rewards;
use crate::states::*;
use crate::utils::transfer_from_pool_vault_to_user;
use crate::AUTH_SEED;
use anchor_lang::prelude::*;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

/// Claim the caller's share of already-settled epoch rewards.
///
/// Reward math overview:
/// - Per-epoch index: `pool_ledger.epochs[e].acc_reward_per_share` accumulates
///   net reward per share held during `e`, scaled by `PRECISION`.
/// - Per-owner debt: `owner_ledger.epochs[e].reward_debt` stores what was
///   already paid against that index.
/// - Payable = `floor(shares_at(e) * index / PRECISION) - debt`.
#[derive(Accounts)]
pub struct ClaimOwner<'info> {
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

    #[account(
        mut,
        token::mint = asset_mint,
    )]
    pub recipient_token: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,

    pub system_program: Program<'info, System>,
}

/// Steps:
/// 1) Settle and validate the epoch list.
/// 2) Resolve `accumulated - debt` per epoch and move each debt up.
/// 3) Transfer the total from custody in a single transfer.
pub fn claim_owner(ctx: Context<ClaimOwner>, epochs: Vec<u64>) -> Result<()> {
    let current = settle_to_current(&mut ctx.accounts.pool_info, &mut ctx.accounts.pool_ledger)?;

    let amount = rewards::claim_owner(
        &mut ctx.accounts.pool_info,
        &mut ctx.accounts.owner_ledger,
        &ctx.accounts.pool_ledger,
        &epochs,
        current,
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

    emit!(OwnerRewardsClaimed {
        owner: ctx.accounts.owner.key(),
        recipient: ctx.accounts.recipient_token.key(),
        epochs,
        amount,
    });
    Ok(())
}
