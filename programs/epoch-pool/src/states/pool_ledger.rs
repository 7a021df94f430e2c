use crate::error::ErrorCode;
use crate::ledger::{Checkpoint, RewardStream, ShareHistory};
use crate::MAX_EPOCHS_PER_CLAIM;
use anchor_lang::prelude::*;

//
// ──────────────────────────────────────────────────────────────────────────────
// PoolLedger Account
// ──────────────────────────────────────────────────────────────────────────────
//

/// PDA seed string used to derive the pool-wide checkpoint ledger.
pub const POOL_LEDGER_SEED: &str = "pool_ledger";

/// Principal queued to become active shares at `epoch`.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct ScheduledActivation {
    pub epoch: u64,
    pub amount: u64,
}

impl ScheduledActivation {
    pub const LEN: usize = 8 + 8;
}

/// Credit and reward indices for one epoch.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct EpochRecord {
    pub epoch: u64,

    /// Raw credits reported for the pool during this epoch.
    pub credits_total: u64,

    /// Credits per active share at forward time, scaled by `PRECISION`.
    pub acc_credits_per_share: u128,

    /// Net reward per share held during the epoch, scaled by `PRECISION`.
    pub acc_reward_per_share: u128,

    /// Gross inflow observed when the regular stream was claimed.
    pub regular_gross: u64,

    /// Gross inflow observed when the bonus stream was claimed.
    pub bonus_gross: u64,

    /// Net rewards spread into `acc_reward_per_share` (both streams).
    pub net_rewards: u64,

    pub regular_claimed: bool,
    pub bonus_claimed: bool,
}

impl EpochRecord {
    /// Breakdown:
    /// - 8 * 2: epoch, credits_total
    /// - 16 * 2: two `u128` indices
    /// - 8 * 3: gross and net amounts
    /// - 1 + 1: claimed flags
    pub const LEN: usize = 8 * 2 + 16 * 2 + 8 * 3 + 1 + 1;

    pub fn new(epoch: u64) -> Self {
        Self {
            epoch,
            ..Default::default()
        }
    }

    pub fn is_claimed(&self, stream: RewardStream) -> bool {
        match stream {
            RewardStream::Regular => self.regular_claimed,
            RewardStream::Bonus => self.bonus_claimed,
        }
    }
}

/// Pool-wide share history, the pending activation queue and the per-epoch
/// indices. Vectors grow through `realloc` on the instructions that write them.
#[account]
#[derive(Default, Debug)]
pub struct PoolLedger {
    /// PDA bump for this account.
    pub bump: u8,

    /// Total shares per epoch.
    pub total_shares: ShareHistory,

    /// Pending activations keyed by activation epoch. A bucket is dropped once it
    /// is applied or emptied, after which `scheduled_activation` reads it as zero.
    pub scheduled: Vec<ScheduledActivation>,

    /// Epoch records sorted by epoch, created on the first credit or reward event.
    pub epochs: Vec<EpochRecord>,
}

impl PoolLedger {
    /// Serialized size for the given entry counts.
    ///
    /// Breakdown:
    /// - 8: account discriminator
    /// - 1: bump
    /// - 4 + 16 * checkpoints
    /// - 4 + 16 * scheduled
    /// - 4 + 74 * epochs
    pub fn space(checkpoints: usize, scheduled: usize, epochs: usize) -> usize {
        8 + 1
            + ShareHistory::space(checkpoints)
            + 4
            + scheduled * ScheduledActivation::LEN
            + 4
            + epochs * EpochRecord::LEN
    }

    /// Size for the initial allocation.
    pub fn initial_space() -> usize {
        Self::space(2, 1, MAX_EPOCHS_PER_CLAIM)
    }

    /// Current contents plus room for what one instruction can add.
    pub fn space_with_headroom(&self) -> usize {
        Self::space(
            self.total_shares.len() + 2,
            self.scheduled.len() + 1,
            self.epochs.len() + MAX_EPOCHS_PER_CLAIM,
        )
    }

    pub fn total_shares_at(&self, epoch: u64) -> u64 {
        self.total_shares.shares_at(epoch)
    }

    pub fn latest_checkpoint(&self) -> Option<Checkpoint> {
        self.total_shares.latest()
    }

    /// Amount queued for `epoch`; zero when nothing is scheduled.
    pub fn scheduled_activation(&self, epoch: u64) -> u64 {
        self.scheduled
            .iter()
            .find(|s| s.epoch == epoch)
            .map(|s| s.amount)
            .unwrap_or(0)
    }

    pub fn epoch_record(&self, epoch: u64) -> Option<&EpochRecord> {
        self.epochs
            .binary_search_by_key(&epoch, |r| r.epoch)
            .ok()
            .map(|idx| &self.epochs[idx])
    }

    /// Record for `epoch`, inserted in order when missing.
    pub fn epoch_mut(&mut self, epoch: u64) -> &mut EpochRecord {
        let idx = match self.epochs.binary_search_by_key(&epoch, |r| r.epoch) {
            Ok(idx) => idx,
            Err(idx) => {
                self.epochs.insert(idx, EpochRecord::new(epoch));
                idx
            }
        };
        &mut self.epochs[idx]
    }

    /// Adds `amount` to the bucket for `epoch`.
    pub fn schedule(&mut self, epoch: u64, amount: u64) -> Result<()> {
        match self.scheduled.iter_mut().find(|s| s.epoch == epoch) {
            Some(bucket) => {
                bucket.amount = bucket
                    .amount
                    .checked_add(amount)
                    .ok_or(ErrorCode::MathOverflow)?;
            }
            None => self.scheduled.push(ScheduledActivation { epoch, amount }),
        }
        Ok(())
    }

    /// Removes `amount` from the bucket for `epoch`, dropping it once empty.
    pub fn unschedule(&mut self, epoch: u64, amount: u64) -> Result<()> {
        if amount == 0 {
            return Ok(());
        }
        let idx = self
            .scheduled
            .iter()
            .position(|s| s.epoch == epoch)
            .ok_or(ErrorCode::ActivationOutOfOrder)?;
        let remaining = self.scheduled[idx]
            .amount
            .checked_sub(amount)
            .ok_or(ErrorCode::ActivationOutOfOrder)?;
        if remaining == 0 {
            self.scheduled.remove(idx);
        } else {
            self.scheduled[idx].amount = remaining;
        }
        Ok(())
    }
}

#[cfg(all(test, not(target_arch = "bpf")))]
mod tests {
    use super::*;

    #[test]
    fn emptied_bucket_reads_as_zero() {
        let mut ledger = PoolLedger::default();
        ledger.schedule(3, 40).unwrap();
        ledger.schedule(3, 10).unwrap();
        assert_eq!(ledger.scheduled_activation(3), 50);

        ledger.unschedule(3, 20).unwrap();
        assert_eq!(ledger.scheduled_activation(3), 30);
        ledger.unschedule(3, 30).unwrap();
        assert!(ledger.scheduled.is_empty());
        assert_eq!(ledger.scheduled_activation(3), 0);

        assert_eq!(
            ledger.unschedule(3, 1).unwrap_err(),
            ErrorCode::ActivationOutOfOrder.into()
        );
    }
}
