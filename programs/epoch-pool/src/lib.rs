use anchor_lang::prelude::*;
#[cfg(not(feature = "no-entrypoint"))]
use solana_security_txt::security_txt;

declare_id!("EFpdPGHTYT3Y7N7PNrSAtDeoXr6qmAzChY8rLPVeMf2z");

#[cfg(not(feature = "no-entrypoint"))]
security_txt! {
    name: "epoch-pool",
    project_url: "https://github.com/epoch-pool/epoch-pool",
    contacts: "email:security@epoch-pool.dev",
    policy: "https://github.com/epoch-pool/epoch-pool/blob/main/SECURITY.md",
    source_code: "https://github.com/epoch-pool/epoch-pool"
}

pub mod deployer {
    use anchor_lang::prelude::declare_id;
    declare_id!("7EPUF7pJmbbWtua4Tqn1ZbWX7TkgDG1BEccTa9QE1h6N");
}

pub const AUTH_SEED: &str = "pool_authority";
pub const CUSTODY_VAULT_SEED: &str = "custody_vault";
pub const PRECISION: u128 = 1_000_000_000_000_000_000;
pub const MAX_EPOCHS_PER_CLAIM: usize = 16;

pub mod error;
pub mod instructions;
pub mod ledger;
pub mod mining_cpi;
pub mod states;
pub mod utils;

use instructions::*;

#[program]
pub mod epoch_pool {

    use super::*;

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
        instructions::initialise_pool(
            ctx,
            forwarder,
            fee_rate,
            mining_program,
            miner_position,
            mining_stake_vault,
            bonus_program,
            receipt_tag,
            min_receipt_len,
            max_receipt_len,
        )
    }

    pub fn open_owner_ledger(ctx: Context<OpenOwnerLedger>) -> Result<()> {
        instructions::open_owner_ledger(ctx)
    }

    pub fn checkpoint(ctx: Context<Checkpoint>) -> Result<()> {
        instructions::checkpoint(ctx)
    }

    pub fn deposit(ctx: Context<Deposit>, amount: u64) -> Result<()> {
        instructions::deposit(ctx, amount)
    }

    pub fn withdraw_principal(ctx: Context<WithdrawPrincipal>, amount: u64) -> Result<()> {
        instructions::withdraw_principal(ctx, amount)
    }

    pub fn submit_receipt<'info>(
        ctx: Context<'_, '_, 'info, 'info, SubmitReceipt<'info>>,
        payload: Vec<u8>,
    ) -> Result<()> {
        instructions::submit_receipt(ctx, payload)
    }

    pub fn claim_regular<'info>(
        ctx: Context<'_, '_, 'info, 'info, ClaimStream<'info>>,
        epochs: Vec<u64>,
    ) -> Result<()> {
        instructions::claim_regular(ctx, epochs)
    }

    pub fn claim_bonus<'info>(
        ctx: Context<'_, '_, 'info, 'info, ClaimStream<'info>>,
        epochs: Vec<u64>,
    ) -> Result<()> {
        instructions::claim_bonus(ctx, epochs)
    }

    pub fn claim_owner(ctx: Context<ClaimOwner>, epochs: Vec<u64>) -> Result<()> {
        instructions::claim_owner(ctx, epochs)
    }

    pub fn unstake_at_epoch_end(ctx: Context<UnstakeAtEpochEnd>) -> Result<()> {
        instructions::unstake_at_epoch_end(ctx)
    }

    pub fn finalize_withdraw(ctx: Context<FinalizeWithdraw>) -> Result<()> {
        instructions::finalize_withdraw(ctx)
    }

    pub fn restake(ctx: Context<StakeShortfall>) -> Result<()> {
        instructions::restake(ctx)
    }

    pub fn stake_principal(ctx: Context<StakeShortfall>) -> Result<()> {
        instructions::stake_principal(ctx)
    }
}
