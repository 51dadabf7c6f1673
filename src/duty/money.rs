//! Fixed-point money arithmetic for customs valuation.
//!
//! Every monetary result leaves this module with exactly two decimal places,
//! rounded half-up. Inputs are expected to be non-negative; that is checked
//! at the request boundary, not here. Sums that leave the `Decimal` range
//! come back as `None`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Rounds half-up to two decimal places and pins the scale at two.
pub fn round2(value: Decimal) -> Decimal {
    // away-from-zero equals half-up on the non-negative domain
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

pub fn compute_cif(
    product_cost: Decimal,
    freight: Decimal,
    insurance: Decimal,
) -> Option<Decimal> {
    product_cost
        .checked_add(freight)?
        .checked_add(insurance)
        .map(round2)
}

pub fn compute_landed_cost(cif_value: Decimal, total_duty: Decimal) -> Option<Decimal> {
    cif_value.checked_add(total_duty).map(round2)
}

/// `total / cif * 100`, or 0 when there is no customs value to compare to.
pub fn effective_rate_percent(total_amount: Decimal, cif_value: Decimal) -> f64 {
    if cif_value <= Decimal::ZERO {
        return 0.0;
    }
    total_amount
        .checked_div(cif_value)
        .and_then(|ratio| ratio.checked_mul(HUNDRED))
        .and_then(|pct| pct.to_f64())
        .unwrap_or(0.0)
}

pub(crate) fn percent_of(base: Decimal, rate_percent: Decimal) -> Option<Decimal> {
    base.checked_mul(rate_percent)?
        .checked_div(HUNDRED)
        .map(round2)
}

pub(crate) fn cents_per_kg_amount(cents_per_kg: Decimal, weight_kg: Decimal) -> Option<Decimal> {
    cents_per_kg
        .checked_mul(weight_kg)?
        .checked_div(HUNDRED)
        .map(round2)
}

pub(crate) fn per_unit_amount(dollars_per_unit: Decimal, quantity: u32) -> Option<Decimal> {
    dollars_per_unit
        .checked_mul(Decimal::from(quantity))
        .map(round2)
}

/// Renders a dollar rate with at least two decimals, keeping extra precision.
pub(crate) fn display_dollars(value: Decimal) -> String {
    let normalized = value.normalize();
    if normalized.scale() < 2 {
        let mut padded = normalized;
        padded.rescale(2);
        padded.to_string()
    } else {
        normalized.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn round2_is_half_up_with_fixed_scale() {
        assert_eq!(round2(dec!(2.345)).to_string(), "2.35");
        assert_eq!(round2(dec!(2.344)).to_string(), "2.34");
        assert_eq!(round2(dec!(0.005)).to_string(), "0.01");
        assert_eq!(round2(dec!(50)).to_string(), "50.00");
        assert_eq!(round2(dec!(22.5)).to_string(), "22.50");
    }

    #[test]
    fn cif_sums_and_rounds() {
        let cif = compute_cif(dec!(10000), dec!(500), dec!(100)).unwrap();
        assert_eq!(cif.to_string(), "10600.00");

        let cif = compute_cif(dec!(0.105), dec!(0), dec!(0)).unwrap();
        assert_eq!(cif, round2(dec!(0.105)));
        assert_eq!(cif.to_string(), "0.11");
    }

    #[test]
    fn landed_cost_adds_duty() {
        assert_eq!(
            compute_landed_cost(dec!(21300.00), dec!(5623.20))
                .unwrap()
                .to_string(),
            "26923.20"
        );
    }

    #[test]
    fn sums_past_decimal_range_are_none() {
        assert_eq!(compute_cif(Decimal::MAX, dec!(1), dec!(0)), None);
        assert_eq!(compute_cif(Decimal::MAX, dec!(0), dec!(1)), None);
        assert_eq!(compute_landed_cost(Decimal::MAX, dec!(5)), None);
    }

    #[test]
    fn effective_rate_handles_zero_cif() {
        assert_eq!(effective_rate_percent(dec!(10), Decimal::ZERO), 0.0);
        assert!((effective_rate_percent(dec!(22.50), dec!(1000)) - 2.25).abs() < 1e-9);
    }

    #[test]
    fn specific_amounts_round_once() {
        assert_eq!(cents_per_kg_amount(dec!(4.5), dec!(500)), Some(dec!(22.50)));
        assert_eq!(cents_per_kg_amount(dec!(1.7), dec!(0.3)), Some(dec!(0.01)));
        assert_eq!(per_unit_amount(dec!(1.50), 10), Some(dec!(15.00)));
        assert_eq!(percent_of(dec!(21300), dec!(26.4)), Some(dec!(5623.20)));
    }

    #[test]
    fn dollar_display_pads_to_cents() {
        assert_eq!(display_dollars(dec!(1.5)), "1.50");
        assert_eq!(display_dollars(dec!(2)), "2.00");
        assert_eq!(display_dollars(dec!(0.125)), "0.125");
    }
}
