use crate::error::ErrorCode;
use anchor_lang::prelude::*;

//
// ──────────────────────────────────────────────────────────────────────────────
// Share checkpoints
// ──────────────────────────────────────────────────────────────────────────────
//

/// A share count valid from `epoch` onward until superseded by a later entry.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    pub epoch: u64,
    pub shares: u64,
}

impl Checkpoint {
    /// 8 (epoch) + 8 (shares)
    pub const LEN: usize = 8 + 8;
}

/// Versioned share count, ordered by strictly increasing epoch.
///
/// Writers only ever touch the current epoch and the one after it, so a new
/// entry lands either at the tail or one slot before it. Lookups binary search
/// for the latest entry at or before the requested epoch.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Default, Debug, PartialEq, Eq)]
pub struct ShareHistory {
    pub checkpoints: Vec<Checkpoint>,
}

impl ShareHistory {
    /// Serialized size with `entries` checkpoints (4-byte vec length prefix).
    pub fn space(entries: usize) -> usize {
        4 + entries * Checkpoint::LEN
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    pub fn latest(&self) -> Option<Checkpoint> {
        self.checkpoints.last().copied()
    }

    /// Shares recorded at or before `epoch`; zero before the first checkpoint.
    pub fn shares_at(&self, epoch: u64) -> u64 {
        let idx = self.checkpoints.partition_point(|c| c.epoch <= epoch);
        if idx == 0 {
            0
        } else {
            self.checkpoints[idx - 1].shares
        }
    }

    /// Writes `shares` at `epoch`.
    ///
    /// - newer than the tail: append
    /// - equal to the tail: overwrite the tail
    /// - between the second-to-last entry and the tail: insert before the tail,
    ///   or overwrite the second-to-last entry when the epochs coincide
    /// - older than the second-to-last entry: `CheckpointOrderViolation`
    pub fn record(&mut self, epoch: u64, shares: u64) -> Result<()> {
        let len = self.checkpoints.len();
        let tail = match self.checkpoints.last().copied() {
            Some(tail) => tail,
            None => {
                self.checkpoints.push(Checkpoint { epoch, shares });
                return Ok(());
            }
        };

        if epoch > tail.epoch {
            self.checkpoints.push(Checkpoint { epoch, shares });
            return Ok(());
        }
        if epoch == tail.epoch {
            self.checkpoints[len - 1].shares = shares;
            return Ok(());
        }

        if len >= 2 {
            let prev = self.checkpoints[len - 2];
            if prev.epoch == epoch {
                self.checkpoints[len - 2].shares = shares;
                return Ok(());
            }
            require!(epoch > prev.epoch, ErrorCode::CheckpointOrderViolation);
        }

        self.checkpoints.push(tail);
        self.checkpoints[len - 1] = Checkpoint { epoch, shares };
        Ok(())
    }
}
