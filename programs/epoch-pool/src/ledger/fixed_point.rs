//! Fixed-point helpers for the per-share indices.

#![allow(clippy::assign_op_pattern)]
#![allow(clippy::ptr_offset_with_cast)]
#![allow(clippy::manual_range_contains)]

use crate::ledger::FEE_RATE_DENOMINATOR_VALUE;
use crate::PRECISION;
use uint::construct_uint;

construct_uint! {
    pub struct U256(4);
}

/// Index increment for spreading `amount` over `total_shares`, scaled by `PRECISION`.
///
/// Returns `None` when there are no shares to spread over.
pub fn index_delta(amount: u64, total_shares: u64) -> Option<u128> {
    if total_shares == 0 {
        return None;
    }
    // u64 * 1e18 stays below 2^124
    (amount as u128)
        .checked_mul(PRECISION)?
        .checked_div(total_shares as u128)
}

/// `floor(shares * index / PRECISION)`, computed in 256 bits.
pub fn accumulated(shares: u64, index: u128) -> Option<u64> {
    let value = U256::from(shares)
        .checked_mul(U256::from(index))?
        .checked_div(U256::from(PRECISION))?;
    if value > U256::from(u64::MAX) {
        return None;
    }
    Some(value.low_u64())
}

/// Splits a gross inflow into `(fee, net)` at a basis-point rate. Fee rounds down.
pub fn split_fee(gross: u64, fee_rate: u64) -> Option<(u64, u64)> {
    let fee = (gross as u128)
        .checked_mul(fee_rate as u128)?
        .checked_div(FEE_RATE_DENOMINATOR_VALUE as u128)?;
    let fee = u64::try_from(fee).ok()?;
    let net = gross.checked_sub(fee)?;
    Some((fee, net))
}

#[cfg(all(test, not(target_arch = "bpf")))]
mod tests {
    use super::*;
    use quickcheck::quickcheck;

    #[test]
    fn fee_split_at_five_percent() {
        assert_eq!(split_fee(1_000, 500), Some((50, 950)));
        assert_eq!(split_fee(200, 500), Some((10, 190)));
        assert_eq!(split_fee(19, 500), Some((0, 19)));
    }

    #[test]
    fn index_round_trip_floors() {
        let idx = index_delta(950, 200).unwrap();
        assert_eq!(accumulated(100, idx), Some(475));
        let idx = index_delta(1, 3).unwrap();
        assert_eq!(accumulated(1, idx), Some(0));
        assert_eq!(accumulated(3, idx), Some(0));
    }

    #[test]
    fn zero_total_has_no_index() {
        assert_eq!(index_delta(10, 0), None);
    }

    #[test]
    fn accumulated_handles_wide_products() {
        let idx = index_delta(u64::MAX, 1).unwrap();
        assert_eq!(accumulated(1, idx), Some(u64::MAX));
        assert_eq!(accumulated(2, idx), None);
    }

    quickcheck! {
        fn fee_and_net_sum_to_gross(gross: u64, rate: u16) -> bool {
            let rate = (rate as u64) % (FEE_RATE_DENOMINATOR_VALUE + 1);
            match split_fee(gross, rate) {
                Some((fee, net)) => fee.checked_add(net) == Some(gross) && fee <= gross,
                None => false,
            }
        }

        fn shares_never_overdraw(amount: u64, a: u32, b: u32) -> bool {
            let (a, b) = (a as u64 + 1, b as u64 + 1);
            let idx = index_delta(amount, a + b).unwrap();
            let paid = accumulated(a, idx).unwrap() as u128 + accumulated(b, idx).unwrap() as u128;
            paid <= amount as u128 && amount as u128 - paid <= 2
        }
    }
}
