use crate::error::ErrorCode;
use crate::ledger::ShareHistory;
use crate::MAX_EPOCHS_PER_CLAIM;
use anchor_lang::prelude::*;

//
// ──────────────────────────────────────────────────────────────────────────────
// OwnerLedger Account
// ──────────────────────────────────────────────────────────────────────────────
//

/// PDA seed string used to derive each owner's ledger: `OWNER_LEDGER_SEED + owner`.
pub const OWNER_LEDGER_SEED: &str = "owner_ledger";

/// Per-(owner, epoch) debts and attributed amounts.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct OwnerEpoch {
    pub epoch: u64,

    /// Rewards already accounted for at this epoch's reward index.
    pub reward_debt: u64,

    /// Credits already accounted for at this epoch's credit index.
    pub credit_debt: u64,

    /// Credits banked before the owner's active shares changed mid-epoch.
    pub credits_accrued: u64,

    /// Rewards paid for this epoch.
    pub rewards_paid: u64,
}

impl OwnerEpoch {
    pub const LEN: usize = 8 * 5;

    pub fn new(epoch: u64) -> Self {
        Self {
            epoch,
            ..Default::default()
        }
    }
}

/// Principal record, share history and per-epoch debts of a single owner.
#[account]
#[derive(Default, Debug)]
pub struct OwnerLedger {
    /// PDA bump for this account.
    pub bump: u8,

    /// Owner to whom this record belongs.
    pub owner: Pubkey,

    /// Cumulative principal deposited.
    pub deposited: u64,

    /// Cumulative principal withdrawn.
    pub withdrawn: u64,

    /// Cumulative rewards paid through `claim_owner`.
    pub rewards_claimed: u64,

    /// Owner shares per epoch.
    pub shares: ShareHistory,

    /// Sorted by epoch; created on the first claim or mid-epoch share change.
    pub epochs: Vec<OwnerEpoch>,
}

impl OwnerLedger {
    /// Breakdown:
    /// - 8: account discriminator
    /// - 1: bump
    /// - 32: owner
    /// - 8 * 3: principal and reward totals
    /// - 4 + 16 * checkpoints
    /// - 4 + 40 * epochs
    pub fn space(checkpoints: usize, epochs: usize) -> usize {
        8 + 1 + 32 + 8 * 3 + ShareHistory::space(checkpoints) + 4 + epochs * OwnerEpoch::LEN
    }

    pub fn initial_space() -> usize {
        Self::space(2, MAX_EPOCHS_PER_CLAIM)
    }

    pub fn space_with_headroom(&self) -> usize {
        Self::space(
            self.shares.len() + 2,
            self.epochs.len() + MAX_EPOCHS_PER_CLAIM,
        )
    }

    /// Principal still owed to the owner.
    pub fn liability(&self) -> Result<u64> {
        self.deposited
            .checked_sub(self.withdrawn)
            .ok_or_else(|| error!(ErrorCode::MathOverflow))
    }

    pub fn shares_at(&self, epoch: u64) -> u64 {
        self.shares.shares_at(epoch)
    }

    pub fn epoch_record(&self, epoch: u64) -> Option<&OwnerEpoch> {
        self.epochs
            .binary_search_by_key(&epoch, |r| r.epoch)
            .ok()
            .map(|idx| &self.epochs[idx])
    }

    pub fn epoch_mut(&mut self, epoch: u64) -> &mut OwnerEpoch {
        let idx = match self.epochs.binary_search_by_key(&epoch, |r| r.epoch) {
            Ok(idx) => idx,
            Err(idx) => {
                self.epochs.insert(idx, OwnerEpoch::new(epoch));
                idx
            }
        };
        &mut self.epochs[idx]
    }
}
