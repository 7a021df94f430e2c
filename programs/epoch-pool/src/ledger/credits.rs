//! Credit index: spreads backend credit deltas over the shares active at
//! forward time.

use crate::error::ErrorCode;
use crate::ledger::lifecycle::{require_phase, Phase};
use crate::ledger::{accumulated, index_delta};
use crate::states::{OwnerLedger, PoolInfo, PoolLedger};
use anchor_lang::prelude::*;

/// Outcome of a forwarded receipt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ForwardOutcome {
    pub credits_delta: u64,
    pub acc_credits_per_share: u128,
}

/// Owner credit state for one epoch after a mid-epoch share change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreditRebase {
    pub epoch: u64,
    pub credits_accrued: u64,
    pub credit_debt: u64,
}

/// Forwarding needs the active phase and at least one active share to attribute
/// credits to.
pub fn ensure_forwardable(info: &PoolInfo) -> Result<()> {
    require_phase(info, Phase::ActiveStaked)?;
    require!(info.active_total_shares > 0, ErrorCode::NoActiveShares);
    Ok(())
}

/// Adds the backend credit delta observed around a forward to `epoch`.
pub fn record_forward(
    info: &mut PoolInfo,
    ledger: &mut PoolLedger,
    epoch: u64,
    credits_before: u64,
    credits_after: u64,
) -> Result<ForwardOutcome> {
    require!(
        credits_after > credits_before,
        ErrorCode::CreditsDidNotIncrease
    );
    let delta = credits_after - credits_before;
    let index = index_delta(delta, info.active_total_shares).ok_or(ErrorCode::NoActiveShares)?;

    let current = ledger.epoch_record(epoch).copied().unwrap_or_default();
    let credits_total = current
        .credits_total
        .checked_add(delta)
        .ok_or(ErrorCode::MathOverflow)?;
    let acc_credits_per_share = current
        .acc_credits_per_share
        .checked_add(index)
        .ok_or(ErrorCode::MathOverflow)?;
    let total_credits = info
        .total_credits
        .checked_add(delta)
        .ok_or(ErrorCode::MathOverflow)?;

    let record = ledger.epoch_mut(epoch);
    record.credits_total = credits_total;
    record.acc_credits_per_share = acc_credits_per_share;
    info.total_credits = total_credits;

    Ok(ForwardOutcome {
        credits_delta: delta,
        acc_credits_per_share,
    })
}

/// Banks the credits earned by `old_shares` at `epoch` and re-bases the debt on
/// `new_shares`. `None` when no credits were forwarded for the epoch yet.
pub fn rebase_owner_credits(
    ledger: &PoolLedger,
    owner: &OwnerLedger,
    epoch: u64,
    old_shares: u64,
    new_shares: u64,
) -> Result<Option<CreditRebase>> {
    let index = match ledger.epoch_record(epoch) {
        Some(record) if record.acc_credits_per_share > 0 => record.acc_credits_per_share,
        _ => return Ok(None),
    };
    let entry = owner.epoch_record(epoch).copied().unwrap_or_default();

    let earned = accumulated(old_shares, index).ok_or(ErrorCode::MathOverflow)?;
    let pending = earned
        .checked_sub(entry.credit_debt)
        .ok_or(ErrorCode::DebtExceedsAccumulated)?;
    let credits_accrued = entry
        .credits_accrued
        .checked_add(pending)
        .ok_or(ErrorCode::MathOverflow)?;
    let credit_debt = accumulated(new_shares, index).ok_or(ErrorCode::MathOverflow)?;

    Ok(Some(CreditRebase {
        epoch,
        credits_accrued,
        credit_debt,
    }))
}

pub fn apply_rebase(owner: &mut OwnerLedger, rebase: CreditRebase) {
    let entry = owner.epoch_mut(rebase.epoch);
    entry.credits_accrued = rebase.credits_accrued;
    entry.credit_debt = rebase.credit_debt;
}

/// Credits attributed to the owner for `epoch`.
pub fn owner_credits(ledger: &PoolLedger, owner: &OwnerLedger, epoch: u64) -> Result<u64> {
    let index = ledger
        .epoch_record(epoch)
        .map(|r| r.acc_credits_per_share)
        .unwrap_or(0);
    let entry = owner.epoch_record(epoch).copied().unwrap_or_default();
    let earned = accumulated(owner.shares_at(epoch), index).ok_or(ErrorCode::MathOverflow)?;
    let pending = earned
        .checked_sub(entry.credit_debt)
        .ok_or(ErrorCode::DebtExceedsAccumulated)?;
    entry
        .credits_accrued
        .checked_add(pending)
        .ok_or_else(|| error!(ErrorCode::MathOverflow))
}

#[cfg(all(test, not(target_arch = "bpf")))]
mod tests {
    use super::*;
    use crate::ledger::activation::{schedule_deposit, settle, withdraw_principal};

    fn active_pool(deposits: &[u64]) -> (PoolInfo, PoolLedger, Vec<OwnerLedger>) {
        let mut info = PoolInfo {
            last_settled_epoch: 1,
            ..Default::default()
        };
        let mut ledger = PoolLedger::default();
        let mut owners = Vec::new();
        for &amount in deposits {
            let mut owner = OwnerLedger::default();
            schedule_deposit(&mut info, &mut ledger, &mut owner, 1, amount).unwrap();
            owners.push(owner);
        }
        settle(&mut info, &mut ledger, 2).unwrap();
        (info, ledger, owners)
    }

    #[test]
    fn forward_spreads_delta_over_active_shares() {
        let (mut info, mut ledger, owners) = active_pool(&[100, 300]);
        let out = record_forward(&mut info, &mut ledger, 2, 10, 410).unwrap();
        assert_eq!(out.credits_delta, 400);
        assert_eq!(ledger.epoch_record(2).unwrap().credits_total, 400);
        assert_eq!(info.total_credits, 400);
        assert_eq!(owner_credits(&ledger, &owners[0], 2).unwrap(), 100);
        assert_eq!(owner_credits(&ledger, &owners[1], 2).unwrap(), 300);
    }

    #[test]
    fn non_increasing_credits_are_rejected() {
        let (mut info, mut ledger, _) = active_pool(&[100]);
        for (before, after) in [(5, 5), (5, 4)] {
            let err = record_forward(&mut info, &mut ledger, 2, before, after).unwrap_err();
            assert_eq!(err, ErrorCode::CreditsDidNotIncrease.into());
        }
        assert!(ledger.epoch_record(2).is_none());
    }

    #[test]
    fn forwarding_requires_active_phase_and_shares() {
        let info = PoolInfo::default();
        assert_eq!(
            ensure_forwardable(&info).unwrap_err(),
            ErrorCode::NoActiveShares.into()
        );
        let info = PoolInfo {
            phase: Phase::Cooldown,
            active_total_shares: 10,
            ..Default::default()
        };
        assert_eq!(
            ensure_forwardable(&info).unwrap_err(),
            ErrorCode::PhaseMismatch.into()
        );
    }

    #[test]
    fn withdrawn_shares_keep_credits_earned_before_withdrawal() {
        let (mut info, mut ledger, mut owners) = active_pool(&[100, 100]);
        record_forward(&mut info, &mut ledger, 2, 0, 200).unwrap();

        withdraw_principal(&mut info, &mut ledger, &mut owners[0], 2, 50).unwrap();
        assert_eq!(owner_credits(&ledger, &owners[0], 2).unwrap(), 100);

        // 150 shares now active; 300 more credits split 50/100
        record_forward(&mut info, &mut ledger, 2, 200, 500).unwrap();
        assert_eq!(owner_credits(&ledger, &owners[0], 2).unwrap(), 200);
        assert_eq!(owner_credits(&ledger, &owners[1], 2).unwrap(), 300);
    }

    #[test]
    fn credit_debt_above_accumulated_is_rejected() {
        let (mut info, mut ledger, mut owners) = active_pool(&[100]);
        record_forward(&mut info, &mut ledger, 2, 0, 100).unwrap();
        owners[0].epoch_mut(2).credit_debt = 101;
        let epochs = owners[0].epochs.clone();

        assert_eq!(
            owner_credits(&ledger, &owners[0], 2).unwrap_err(),
            ErrorCode::DebtExceedsAccumulated.into()
        );
        assert_eq!(
            rebase_owner_credits(&ledger, &owners[0], 2, 100, 50).unwrap_err(),
            ErrorCode::DebtExceedsAccumulated.into()
        );
        assert_eq!(
            withdraw_principal(&mut info, &mut ledger, &mut owners[0], 2, 50).unwrap_err(),
            ErrorCode::DebtExceedsAccumulated.into()
        );
        assert_eq!(owners[0].epochs, epochs);
        assert_eq!(owners[0].shares_at(2), 100);
    }

    #[test]
    fn deposit_after_boundary_leaves_credit_index_unchanged() {
        let (mut info, mut ledger, _) = active_pool(&[100]);
        record_forward(&mut info, &mut ledger, 2, 0, 100).unwrap();
        let before = *ledger.epoch_record(2).unwrap();

        let mut late = OwnerLedger::default();
        schedule_deposit(&mut info, &mut ledger, &mut late, 2, 900).unwrap();
        assert_eq!(*ledger.epoch_record(2).unwrap(), before);
        assert_eq!(owner_credits(&ledger, &late, 2).unwrap(), 0);
    }
}
