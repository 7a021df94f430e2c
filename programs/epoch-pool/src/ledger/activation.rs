//! Deposit scheduling, lazy activation and principal withdrawal.

use crate::error::ErrorCode;
use crate::ledger::credits;
use crate::states::{OwnerLedger, PoolInfo, PoolLedger};
use anchor_lang::prelude::*;

/// Result of a settlement that moved the settled epoch forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settlement {
    pub from_epoch: u64,
    pub to_epoch: u64,
    pub activated: u64,
}

/// How a principal withdrawal was split between queued and active shares.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WithdrawSplit {
    pub from_pending: u64,
    pub from_active: u64,
}

/// Applies the pending activation, if any, and fast-forwards the settled epoch.
///
/// Every scheduling path settles first and only queues for `current + 1`, so at
/// most one bucket (`last_settled_epoch + 1`) can be outstanding. That makes the
/// step O(1) however many epochs were skipped. Returns `None` when the pool is
/// already settled at `current`.
pub fn settle(
    info: &mut PoolInfo,
    ledger: &mut PoolLedger,
    current: u64,
) -> Result<Option<Settlement>> {
    require!(
        current >= info.last_settled_epoch,
        ErrorCode::EpochRegressed
    );
    if current == info.last_settled_epoch {
        return Ok(None);
    }

    let next = info
        .last_settled_epoch
        .checked_add(1)
        .ok_or(ErrorCode::MathOverflow)?;
    require!(
        ledger.scheduled.iter().all(|s| s.epoch == next),
        ErrorCode::ActivationOutOfOrder
    );
    let activated = ledger.scheduled_activation(next);
    let active_total = info
        .active_total_shares
        .checked_add(activated)
        .ok_or(ErrorCode::MathOverflow)?;
    require!(
        ledger.total_shares_at(current) == active_total,
        ErrorCode::ActivationOutOfOrder
    );

    ledger.scheduled.retain(|s| s.epoch != next);
    let settlement = Settlement {
        from_epoch: info.last_settled_epoch,
        to_epoch: current,
        activated,
    };
    info.active_total_shares = active_total;
    info.last_settled_epoch = current;
    Ok(Some(settlement))
}

/// Queues `amount` of freshly deposited principal as shares for `current + 1`.
///
/// Returns the activation epoch. The pool must already be settled at `current`.
pub fn schedule_deposit(
    info: &mut PoolInfo,
    ledger: &mut PoolLedger,
    owner: &mut OwnerLedger,
    current: u64,
    amount: u64,
) -> Result<u64> {
    require!(amount > 0, ErrorCode::ZeroAmount);
    require!(
        info.last_settled_epoch == current,
        ErrorCode::ActivationOutOfOrder
    );
    let next = current.checked_add(1).ok_or(ErrorCode::MathOverflow)?;

    let owner_queued = owner
        .shares_at(next)
        .checked_add(amount)
        .ok_or(ErrorCode::MathOverflow)?;
    let pool_queued = ledger
        .total_shares_at(next)
        .checked_add(amount)
        .ok_or(ErrorCode::MathOverflow)?;
    let deposited = owner
        .deposited
        .checked_add(amount)
        .ok_or(ErrorCode::MathOverflow)?;
    let total_liability = info
        .total_liability
        .checked_add(amount)
        .ok_or(ErrorCode::MathOverflow)?;

    owner.shares.record(next, owner_queued)?;
    ledger.total_shares.record(next, pool_queued)?;
    ledger.schedule(next, amount)?;
    owner.deposited = deposited;
    info.total_liability = total_liability;
    Ok(next)
}

/// Releases `amount` of the owner's principal.
///
/// Principal still waiting for activation is consumed first; the rest comes out
/// of the owner's active shares at `current`, banking the credits those shares
/// earned so far in the epoch.
pub fn withdraw_principal(
    info: &mut PoolInfo,
    ledger: &mut PoolLedger,
    owner: &mut OwnerLedger,
    current: u64,
    amount: u64,
) -> Result<WithdrawSplit> {
    require!(amount > 0, ErrorCode::ZeroAmount);
    require!(
        info.last_settled_epoch == current,
        ErrorCode::ActivationOutOfOrder
    );
    require!(
        amount <= owner.liability()?,
        ErrorCode::InsufficientPrincipal
    );
    let next = current.checked_add(1).ok_or(ErrorCode::MathOverflow)?;

    let owner_active = owner.shares_at(current);
    let owner_queued = owner.shares_at(next);
    let pending = owner_queued.saturating_sub(owner_active);
    let from_pending = amount.min(pending);
    let from_active = amount - from_pending;
    require!(from_active <= owner_active, ErrorCode::InsufficientPrincipal);

    let new_owner_active = owner_active - from_active;
    let new_owner_queued = owner_queued
        .checked_sub(amount)
        .ok_or(ErrorCode::InsufficientPrincipal)?;
    let new_pool_active = ledger
        .total_shares_at(current)
        .checked_sub(from_active)
        .ok_or(ErrorCode::MathOverflow)?;
    let new_pool_queued = ledger
        .total_shares_at(next)
        .checked_sub(amount)
        .ok_or(ErrorCode::MathOverflow)?;
    let active_total = info
        .active_total_shares
        .checked_sub(from_active)
        .ok_or(ErrorCode::MathOverflow)?;
    let total_liability = info
        .total_liability
        .checked_sub(amount)
        .ok_or(ErrorCode::MathOverflow)?;
    let withdrawn = owner
        .withdrawn
        .checked_add(amount)
        .ok_or(ErrorCode::MathOverflow)?;
    require!(
        ledger.scheduled_activation(next) >= from_pending,
        ErrorCode::ActivationOutOfOrder
    );
    let rebase = if from_active > 0 {
        credits::rebase_owner_credits(ledger, owner, current, owner_active, new_owner_active)?
    } else {
        None
    };

    if from_active > 0 {
        owner.shares.record(current, new_owner_active)?;
        ledger.total_shares.record(current, new_pool_active)?;
    }
    if owner.shares.latest().map(|c| c.epoch) == Some(next) {
        owner.shares.record(next, new_owner_queued)?;
    }
    if ledger.latest_checkpoint().map(|c| c.epoch) == Some(next) {
        ledger.total_shares.record(next, new_pool_queued)?;
    }
    ledger.unschedule(next, from_pending)?;
    if let Some(rebase) = rebase {
        credits::apply_rebase(owner, rebase);
    }
    owner.withdrawn = withdrawn;
    info.active_total_shares = active_total;
    info.total_liability = total_liability;

    Ok(WithdrawSplit {
        from_pending,
        from_active,
    })
}

#[cfg(all(test, not(target_arch = "bpf")))]
mod tests {
    use super::*;

    fn pool_at(epoch: u64) -> (PoolInfo, PoolLedger) {
        let info = PoolInfo {
            genesis_epoch: epoch,
            last_settled_epoch: epoch,
            unstake_not_before_epoch: epoch + 1,
            ..Default::default()
        };
        (info, PoolLedger::default())
    }

    #[test]
    fn deposit_activates_at_next_epoch_only() {
        let (mut info, mut ledger) = pool_at(1);
        let mut owner = OwnerLedger::default();

        let activation = schedule_deposit(&mut info, &mut ledger, &mut owner, 1, 100).unwrap();
        assert_eq!(activation, 2);
        assert_eq!(ledger.scheduled_activation(2), 100);
        assert_eq!(info.active_total_shares, 0);
        assert_eq!(owner.shares_at(1), 0);
        assert_eq!(owner.shares_at(2), 100);
        assert_eq!(info.total_liability, 100);

        let settled = settle(&mut info, &mut ledger, 2).unwrap().unwrap();
        assert_eq!(settled.activated, 100);
        assert_eq!(info.active_total_shares, 100);
        assert_eq!(ledger.scheduled_activation(2), 0);
        assert!(ledger.scheduled.is_empty());
    }

    #[test]
    fn settle_is_idempotent() {
        let (mut info, mut ledger) = pool_at(1);
        let mut owner = OwnerLedger::default();
        schedule_deposit(&mut info, &mut ledger, &mut owner, 1, 40).unwrap();
        assert!(settle(&mut info, &mut ledger, 1).unwrap().is_none());
        settle(&mut info, &mut ledger, 3).unwrap();
        assert!(settle(&mut info, &mut ledger, 3).unwrap().is_none());
        assert_eq!(info.active_total_shares, 40);
    }

    #[test]
    fn large_epoch_jump_applies_activation_exactly_once() {
        let (mut info, mut ledger) = pool_at(1);
        let mut owner = OwnerLedger::default();
        schedule_deposit(&mut info, &mut ledger, &mut owner, 1, 100).unwrap();

        settle(&mut info, &mut ledger, 1_000_000).unwrap();
        assert_eq!(info.active_total_shares, 100);
        assert_eq!(ledger.total_shares_at(1_000_000), 100);
        assert_eq!(ledger.scheduled_activation(2), 0);
        assert_eq!(info.last_settled_epoch, 1_000_000);

        settle(&mut info, &mut ledger, 1_000_001).unwrap();
        assert_eq!(info.active_total_shares, 100);
    }

    #[test]
    fn regressed_epoch_is_rejected() {
        let (mut info, mut ledger) = pool_at(5);
        let err = settle(&mut info, &mut ledger, 4).unwrap_err();
        assert_eq!(err, ErrorCode::EpochRegressed.into());
    }

    #[test]
    fn deposit_requires_settled_pool() {
        let (mut info, mut ledger) = pool_at(1);
        let mut owner = OwnerLedger::default();
        let err = schedule_deposit(&mut info, &mut ledger, &mut owner, 2, 10).unwrap_err();
        assert_eq!(err, ErrorCode::ActivationOutOfOrder.into());
        let err = schedule_deposit(&mut info, &mut ledger, &mut owner, 1, 0).unwrap_err();
        assert_eq!(err, ErrorCode::ZeroAmount.into());
    }

    #[test]
    fn withdraw_consumes_pending_before_active() {
        let (mut info, mut ledger) = pool_at(1);
        let mut owner = OwnerLedger::default();
        schedule_deposit(&mut info, &mut ledger, &mut owner, 1, 100).unwrap();
        settle(&mut info, &mut ledger, 2).unwrap();
        schedule_deposit(&mut info, &mut ledger, &mut owner, 2, 50).unwrap();

        let split = withdraw_principal(&mut info, &mut ledger, &mut owner, 2, 80).unwrap();
        assert_eq!(
            split,
            WithdrawSplit {
                from_pending: 50,
                from_active: 30
            }
        );
        assert_eq!(owner.shares_at(1), 0);
        assert_eq!(owner.shares_at(2), 70);
        assert_eq!(owner.shares_at(3), 70);
        assert_eq!(ledger.total_shares_at(2), 70);
        assert_eq!(ledger.total_shares_at(3), 70);
        assert_eq!(ledger.scheduled_activation(3), 0);
        assert_eq!(info.active_total_shares, 70);
        assert_eq!(info.total_liability, 70);
        assert_eq!(owner.liability().unwrap(), 70);

        settle(&mut info, &mut ledger, 3).unwrap();
        assert_eq!(info.active_total_shares, 70);
    }

    #[test]
    fn withdraw_only_pending_leaves_current_epoch_untouched() {
        let (mut info, mut ledger) = pool_at(1);
        let mut a = OwnerLedger::default();
        let mut b = OwnerLedger::default();
        schedule_deposit(&mut info, &mut ledger, &mut a, 1, 100).unwrap();
        settle(&mut info, &mut ledger, 2).unwrap();
        schedule_deposit(&mut info, &mut ledger, &mut b, 2, 60).unwrap();

        withdraw_principal(&mut info, &mut ledger, &mut b, 2, 20).unwrap();
        assert_eq!(ledger.total_shares_at(2), 100);
        assert_eq!(ledger.total_shares_at(3), 140);
        assert_eq!(ledger.scheduled_activation(3), 40);

        settle(&mut info, &mut ledger, 3).unwrap();
        assert_eq!(info.active_total_shares, 140);
        assert_eq!(b.shares_at(3), 40);
    }

    #[test]
    fn withdraw_more_than_liability_fails_without_mutation() {
        let (mut info, mut ledger) = pool_at(1);
        let mut owner = OwnerLedger::default();
        schedule_deposit(&mut info, &mut ledger, &mut owner, 1, 100).unwrap();
        settle(&mut info, &mut ledger, 2).unwrap();

        let ledger_before = ledger.total_shares.clone();
        let owner_before = owner.shares.clone();
        let err = withdraw_principal(&mut info, &mut ledger, &mut owner, 2, 101).unwrap_err();
        assert_eq!(err, ErrorCode::InsufficientPrincipal.into());
        assert_eq!(ledger.total_shares, ledger_before);
        assert_eq!(owner.shares, owner_before);
        assert_eq!(info.total_liability, 100);
    }
}
