use crate::error::ErrorCode;
use crate::ledger::MAX_FEE_RATE;
use crate::{states::*, AUTH_SEED, CUSTODY_VAULT_SEED};
use anchor_lang::prelude::*;
use anchor_spl::token_interface::{Mint, TokenAccount, TokenInterface};
use std::ops::DerefMut;

/// Accounts context for `initialise_pool`.
///
/// This handler:
/// - Writes the immutable pool configuration.
/// - Creates the pool-wide accounting and checkpoint accounts.
/// - Creates the custody vault owned by the pool authority PDA.
#[derive(Accounts)]
pub struct InitialisePool<'info> {
    /// Deployer signer (must match the program-level deployer id). Funds initialization.
    #[account(
        mut,
        address = crate::deployer::id() @ ErrorCode::InvalidDeployer
    )]
    pub deployer: Signer<'info>,

    /// Pool authority PDA: custody owner and signer for backend CPIs.
    ///
    /// CHECK: PDA derivation enforced via seeds. Holds no data.
    #[account(
        seeds = [AUTH_SEED.as_bytes()],
        bump,
    )]
    pub authority: UncheckedAccount<'info>,

    #[account(
        init,
        seeds = [GLOBAL_CONFIG_SEED.as_bytes()],
        bump,
        payer = deployer,
        space = GlobalConfig::LEN
    )]
    pub global_config: Box<Account<'info, GlobalConfig>>,

    #[account(
        init,
        seeds = [POOL_INFO_SEED.as_bytes()],
        bump,
        payer = deployer,
        space = PoolInfo::LEN
    )]
    pub pool_info: Box<Account<'info, PoolInfo>>,

    #[account(
        init,
        seeds = [POOL_LEDGER_SEED.as_bytes()],
        bump,
        payer = deployer,
        space = PoolLedger::initial_space()
    )]
    pub pool_ledger: Box<Account<'info, PoolLedger>>,

    /// Mint of the pooled asset.
    pub asset_mint: Box<InterfaceAccount<'info, Mint>>,

    /// Program-owned custody vault for unstaked principal and the reward reserve.
    #[account(
        init,
        seeds = [CUSTODY_VAULT_SEED.as_bytes()],
        bump,
        payer = deployer,
        token::mint = asset_mint,
        token::authority = authority,
        token::token_program = token_program,
    )]
    pub custody_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    /// Fee recipient; must hold the pooled asset.
    #[account(
        constraint = fee_vault.mint == asset_mint.key() @ ErrorCode::InvalidMint
    )]
    pub fee_vault: Box<InterfaceAccount<'info, TokenAccount>>,

    pub token_program: Interface<'info, TokenInterface>,

    pub system_program: Program<'info, System>,
}

/// Configuration checks applied before anything is written.
pub fn validate_pool_params(
    forwarder: &Pubkey,
    fee_rate: u64,
    mining_program: &Pubkey,
    miner_position: &Pubkey,
    mining_stake_vault: &Pubkey,
    bonus_program: &Pubkey,
    min_receipt_len: u16,
    max_receipt_len: u16,
) -> Result<()> {
    for key in [
        forwarder,
        mining_program,
        miner_position,
        mining_stake_vault,
        bonus_program,
    ] {
        require!(*key != Pubkey::default(), ErrorCode::InvalidAddress);
    }
    require!(fee_rate <= MAX_FEE_RATE, ErrorCode::FeeRateTooHigh);
    require!(
        min_receipt_len as usize >= RECEIPT_TAG_LEN && min_receipt_len <= max_receipt_len,
        ErrorCode::InvalidReceiptBounds
    );
    Ok(())
}

/// Initializes the pool.
///
/// Steps:
/// 1. Validate configuration (non-default addresses, fee cap, receipt bounds).
/// 2. Write `global_config`.
/// 3. Start `pool_info` in `ActiveStaked`, settled at the current epoch, with the
///    first unstake allowed from the next epoch.
pub fn initialise_pool(
    ctx: Context<InitialisePool>,
    forwarder: Pubkey,
    fee_rate: u64,
    mining_program: Pubkey,
    miner_position: Pubkey,
    mining_stake_vault: Pubkey,
    bonus_program: Pubkey,
    receipt_tag: [u8; 8],
    min_receipt_len: u16,
    max_receipt_len: u16,
) -> Result<()> {
    // ---------------------------
    // 1) Validate
    // ---------------------------
    validate_pool_params(
        &forwarder,
        fee_rate,
        &mining_program,
        &miner_position,
        &mining_stake_vault,
        &bonus_program,
        min_receipt_len,
        max_receipt_len,
    )?;
    let current = Clock::get()?.epoch;
    let first_unstake = current.checked_add(1).ok_or(ErrorCode::MathOverflow)?;

    // ---------------------------
    // 2) Write global config
    // ---------------------------
    let global_config = ctx.accounts.global_config.deref_mut();
    global_config.bump = ctx.bumps.global_config;
    global_config.authority_bump = ctx.bumps.authority;
    global_config.forwarder = forwarder;
    global_config.asset_mint = ctx.accounts.asset_mint.key();
    global_config.custody_vault = ctx.accounts.custody_vault.key();
    global_config.fee_vault = ctx.accounts.fee_vault.key();
    global_config.mining_program = mining_program;
    global_config.miner_position = miner_position;
    global_config.mining_stake_vault = mining_stake_vault;
    global_config.bonus_program = bonus_program;
    global_config.pool_info = ctx.accounts.pool_info.key();
    global_config.pool_ledger = ctx.accounts.pool_ledger.key();
    global_config.fee_rate = fee_rate;
    global_config.receipt_tag = receipt_tag;
    global_config.min_receipt_len = min_receipt_len;
    global_config.max_receipt_len = max_receipt_len;
    msg!("Global Config initialized");

    // ---------------------------
    // 3) Pool state
    // ---------------------------
    let pool_info = ctx.accounts.pool_info.deref_mut();
    pool_info.bump = ctx.bumps.pool_info;
    pool_info.genesis_epoch = current;
    pool_info.last_settled_epoch = current;
    pool_info.last_restake_epoch = current;
    pool_info.unstake_not_before_epoch = first_unstake;

    ctx.accounts.pool_ledger.bump = ctx.bumps.pool_ledger;
    msg!("Pool initialized at epoch {}", current);

    emit!(PoolInitialized {
        forwarder,
        asset_mint: ctx.accounts.asset_mint.key(),
        custody_vault: ctx.accounts.custody_vault.key(),
        fee_vault: ctx.accounts.fee_vault.key(),
        mining_program,
        bonus_program,
        fee_rate,
        genesis_epoch: current,
    });
    Ok(())
}
