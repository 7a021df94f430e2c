use crate::error::ErrorCode;
use crate::ledger::Phase;
use anchor_lang::prelude::*;

//
// ──────────────────────────────────────────────────────────────────────────────
// PoolInfo Account
// ──────────────────────────────────────────────────────────────────────────────
//

/// PDA seed string used to derive the pool-wide accounting account.
pub const POOL_INFO_SEED: &str = "pool_info";

/// Pool-wide scalars: lifecycle phase, settlement marker, aggregate liability
/// and reward totals.
///
/// Share histories and per-epoch indices live in `PoolLedger`; this account
/// stays fixed-size.
#[account]
#[derive(Default, Debug)]
pub struct PoolInfo {
    /// PDA bump for this account.
    pub bump: u8,

    /// Current lifecycle phase.
    pub phase: Phase,

    /// Epoch at which the pool was initialised.
    pub genesis_epoch: u64,

    /// Latest epoch whose scheduled activation has been applied.
    pub last_settled_epoch: u64,

    /// `unstake_at_epoch_end` is rejected before this epoch.
    pub unstake_not_before_epoch: u64,

    /// Epoch of the last `restake`.
    pub last_restake_epoch: u64,

    /// Shares active at `last_settled_epoch`.
    pub active_total_shares: u64,

    /// Sum of every owner's deposited minus withdrawn principal.
    pub total_liability: u64,

    /// Net rewards credited to the reward indices, after fees.
    pub total_rewards_accrued: u64,

    /// Rewards paid out through `claim_owner`.
    pub total_rewards_paid: u64,

    /// Fees sent to the fee vault.
    pub total_fees_paid: u64,

    /// Credits reported by the mining backend across all forwards.
    pub total_credits: u64,
}

impl PoolInfo {
    /// Fixed serialized size of the account (for allocation at initialization).
    ///
    /// Breakdown:
    /// - 8: account discriminator
    /// - 1: bump
    /// - 1: phase
    /// - 8 * 10: ten `u64` fields
    pub const LEN: usize = 8 + 1 + 1 + 8 * 10;

    /// Funds that must stay liquid in custody for claims not yet paid out.
    pub fn reward_reserve(&self) -> Result<u64> {
        self.total_rewards_accrued
            .checked_sub(self.total_rewards_paid)
            .ok_or_else(|| error!(ErrorCode::RewardsOverdrawn))
    }
}
