//! Pool lifecycle: `ActiveStaked -> Cooldown -> WithdrawnIdle -> ActiveStaked`.
//!
//! Every transition is permissionless. Each entry point declares the phase it
//! runs in and fails with `PhaseMismatch` otherwise.

use crate::error::ErrorCode;
use crate::states::PoolInfo;
use anchor_lang::prelude::*;

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// Principal is staked with the mining backend; receipts can be forwarded.
    #[default]
    ActiveStaked,
    /// Unstake requested; waiting for the backend cooldown.
    Cooldown,
    /// Principal is back in custody.
    WithdrawnIdle,
}

pub fn require_phase(info: &PoolInfo, expected: Phase) -> Result<()> {
    require!(info.phase == expected, ErrorCode::PhaseMismatch);
    Ok(())
}

/// Principal that still has to be staked: `liability - staked`.
///
/// Custody must cover it on top of the reward reserve, which stays liquid for
/// owner claims.
pub fn stake_shortfall(info: &PoolInfo, staked: u64, custody_balance: u64) -> Result<u64> {
    let shortfall = info.total_liability.saturating_sub(staked);
    let available = custody_balance
        .checked_sub(info.reward_reserve()?)
        .ok_or(ErrorCode::InsufficientLiquidity)?;
    require!(shortfall <= available, ErrorCode::InsufficientLiquidity);
    Ok(shortfall)
}

/// Principal that can leave custody without touching the reward reserve.
pub fn withdrawable_liquidity(info: &PoolInfo, custody_balance: u64) -> Result<u64> {
    custody_balance
        .checked_sub(info.reward_reserve()?)
        .ok_or_else(|| error!(ErrorCode::InsufficientLiquidity))
}

/// `ActiveStaked -> Cooldown`.
pub fn begin_unstake(info: &mut PoolInfo, staked: u64, current: u64) -> Result<()> {
    require_phase(info, Phase::ActiveStaked)?;
    require!(staked > 0, ErrorCode::NothingStaked);
    require!(
        current >= info.unstake_not_before_epoch,
        ErrorCode::UnstakeBoundaryNotReached
    );
    info.phase = Phase::Cooldown;
    Ok(())
}

/// `Cooldown -> WithdrawnIdle`.
pub fn finalize_withdraw(info: &mut PoolInfo, now: i64, withdrawable_at: i64) -> Result<()> {
    require_phase(info, Phase::Cooldown)?;
    require!(now >= withdrawable_at, ErrorCode::CooldownNotElapsed);
    info.phase = Phase::WithdrawnIdle;
    Ok(())
}

/// `WithdrawnIdle -> ActiveStaked`. Returns the amount to stake, which may be
/// zero; the phase flips and the unstake boundary re-arms either way.
pub fn restake(info: &mut PoolInfo, staked: u64, custody_balance: u64, current: u64) -> Result<u64> {
    require_phase(info, Phase::WithdrawnIdle)?;
    let shortfall = stake_shortfall(info, staked, custody_balance)?;
    let not_before = current.checked_add(1).ok_or(ErrorCode::MathOverflow)?;
    info.phase = Phase::ActiveStaked;
    info.unstake_not_before_epoch = not_before;
    info.last_restake_epoch = current;
    Ok(shortfall)
}

/// Top-up while active. A zero shortfall fails with `NothingToStake`.
pub fn stake_principal(info: &PoolInfo, staked: u64, custody_balance: u64) -> Result<u64> {
    require_phase(info, Phase::ActiveStaked)?;
    let shortfall = stake_shortfall(info, staked, custody_balance)?;
    require!(shortfall > 0, ErrorCode::NothingToStake);
    Ok(shortfall)
}

#[cfg(all(test, not(target_arch = "bpf")))]
mod tests {
    use super::*;

    fn info(phase: Phase) -> PoolInfo {
        PoolInfo {
            phase,
            last_settled_epoch: 10,
            unstake_not_before_epoch: 11,
            total_liability: 1_000,
            total_rewards_accrued: 300,
            total_rewards_paid: 100,
            ..Default::default()
        }
    }

    #[test]
    fn full_cycle() {
        let mut pool = info(Phase::ActiveStaked);
        begin_unstake(&mut pool, 1_000, 11).unwrap();
        assert_eq!(pool.phase, Phase::Cooldown);

        finalize_withdraw(&mut pool, 500, 500).unwrap();
        assert_eq!(pool.phase, Phase::WithdrawnIdle);

        // 1_000 principal + 200 reserve back in custody
        let amount = restake(&mut pool, 0, 1_200, 14).unwrap();
        assert_eq!(amount, 1_000);
        assert_eq!(pool.phase, Phase::ActiveStaked);
        assert_eq!(pool.unstake_not_before_epoch, 15);
        assert_eq!(pool.last_restake_epoch, 14);

        assert_eq!(
            begin_unstake(&mut pool, 1_000, 14).unwrap_err(),
            ErrorCode::UnstakeBoundaryNotReached.into()
        );
    }

    #[test]
    fn transitions_are_phase_gated() {
        let mut pool = info(Phase::Cooldown);
        assert_eq!(
            begin_unstake(&mut pool, 1, 20).unwrap_err(),
            ErrorCode::PhaseMismatch.into()
        );
        assert_eq!(
            restake(&mut pool, 0, 5_000, 20).unwrap_err(),
            ErrorCode::PhaseMismatch.into()
        );
        assert_eq!(
            stake_principal(&pool, 0, 5_000).unwrap_err(),
            ErrorCode::PhaseMismatch.into()
        );
        let mut pool = info(Phase::WithdrawnIdle);
        assert_eq!(
            finalize_withdraw(&mut pool, 0, 0).unwrap_err(),
            ErrorCode::PhaseMismatch.into()
        );
    }

    #[test]
    fn unstake_and_finalize_preconditions() {
        let mut pool = info(Phase::ActiveStaked);
        assert_eq!(
            begin_unstake(&mut pool, 0, 20).unwrap_err(),
            ErrorCode::NothingStaked.into()
        );
        let mut pool = info(Phase::Cooldown);
        assert_eq!(
            finalize_withdraw(&mut pool, 99, 100).unwrap_err(),
            ErrorCode::CooldownNotElapsed.into()
        );
        assert_eq!(pool.phase, Phase::Cooldown);
    }

    #[test]
    fn shortfall_respects_reward_reserve() {
        let pool = info(Phase::ActiveStaked);
        assert_eq!(stake_shortfall(&pool, 600, 600).unwrap(), 400);
        assert_eq!(
            stake_shortfall(&pool, 600, 599).unwrap_err(),
            ErrorCode::InsufficientLiquidity.into()
        );
        assert_eq!(
            stake_principal(&pool, 1_000, 200).unwrap_err(),
            ErrorCode::NothingToStake.into()
        );
    }

    #[test]
    fn withdrawable_liquidity_excludes_reward_reserve() {
        let mut pool = info(Phase::WithdrawnIdle);
        assert_eq!(withdrawable_liquidity(&pool, 1_200).unwrap(), 1_000);
        assert_eq!(withdrawable_liquidity(&pool, 200).unwrap(), 0);
        // only the reserve is left in custody
        assert_eq!(
            withdrawable_liquidity(&pool, 199).unwrap_err(),
            ErrorCode::InsufficientLiquidity.into()
        );

        pool.total_rewards_paid = 301;
        assert_eq!(
            withdrawable_liquidity(&pool, 1_200).unwrap_err(),
            ErrorCode::RewardsOverdrawn.into()
        );
    }

    #[test]
    fn zero_shortfall_restake_still_rearms() {
        let mut pool = info(Phase::WithdrawnIdle);
        pool.total_liability = 0;
        assert_eq!(restake(&mut pool, 0, 200, 30).unwrap(), 0);
        assert_eq!(pool.phase, Phase::ActiveStaked);
        assert_eq!(pool.unstake_not_before_epoch, 31);
    }
}
