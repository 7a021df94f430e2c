use crate::error::ErrorCode;
use crate::instructions::settle_to_current;
use crate::ledger::activation;
use crate::states::*;
use crate::utils::transfer_from_user_to_pool_vault;
use anchor_lang::prelude::*;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};

/// Accounts for `deposit`. Principal moves into custody immediately; the
/// shares it buys only become active at the next epoch.
#[derive(Accounts)]
pub struct Deposit<'info> {
    /// Depositor; pays for any ledger growth.
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

    #[account(address = global_config.asset_mint @ ErrorCode::InvalidMint)]
    pub asset_mint: Box<InterfaceAccount<'info, Mint>>,

    /// Depositor's source token account.
    #[account(
        mut,
        token::mint = asset_mint,
        token::authority = owner,
    )]
    pub owner_token: Box<InterfaceAccount<'info, TokenAccount>>,

    #[account(mut, address = global_config.custody_vault)]
    pub custody_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,

    pub system_program: Program<'info, System>,
}

/// Deposits `amount` of principal.
///
/// Steps:
/// 1) Settle the pool at the current epoch.
/// 2) Queue shares for `current + 1` on the owner and pool histories and add
///    the principal to both liabilities.
/// 3) Transfer the principal into custody.
pub fn deposit(ctx: Context<Deposit>, amount: u64) -> Result<()> {
    // --- 1) Settle ---
    let current = settle_to_current(&mut ctx.accounts.pool_info, &mut ctx.accounts.pool_ledger)?;

    // --- 2) Schedule ---
    let activation_epoch = activation::schedule_deposit(
        &mut ctx.accounts.pool_info,
        &mut ctx.accounts.pool_ledger,
        &mut ctx.accounts.owner_ledger,
        current,
        amount,
    )?;

    // --- 3) Funds into custody ---
    transfer_from_user_to_pool_vault(
        ctx.accounts.owner.to_account_info(),
        ctx.accounts.owner_token.to_account_info(),
        ctx.accounts.custody_vault.to_account_info(),
        ctx.accounts.asset_mint.to_account_info(),
        ctx.accounts.token_program.to_account_info(),
        amount,
        ctx.accounts.asset_mint.decimals,
    )?;

    emit!(PrincipalDeposited {
        owner: ctx.accounts.owner.key(),
        amount,
        activation_epoch,
    });
    Ok(())
}
