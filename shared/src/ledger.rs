//! Stock arithmetic for the ledger engine
//!
//! Every quantity-changing event is a transition on a level snapshot. The
//! backend reads the snapshot under a row lock, applies one of these
//! transitions and writes the result back inside the same transaction, so the
//! functions here never touch storage.

use std::fmt::Display;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// User-facing message carried by a rejected stock-out
pub const STOCK_UNAVAILABLE: &str = "Stock unavailable!";

/// Largest quantity a NUMERIC(18,4) column holds
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(0xA763_FFFF, 0x0DE0_B6B3, 0, false, 4);

/// Largest amount a NUMERIC(18,2) column holds
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xA763_FFFF, 0x0DE0_B6B3, 0, false, 2);

/// Decimal places stored for quantities
pub const QUANTITY_SCALE: u32 = 4;

/// Decimal places stored for money
pub const MONEY_SCALE: u32 = 2;

/// Arithmetic failures of a ledger transition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Stock unavailable! requested {requested}, available {available}")]
    InsufficientStock {
        available: Decimal,
        requested: Decimal,
    },

    #[error("Quantity or amount out of range")]
    OutOfRange,
}

/// How an adjustment treats a result below zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloorPolicy {
    /// Abort the whole operation (stock-out)
    Reject,
    /// Floor the balance at zero (production consumption)
    Clamp,
    /// Let the balance go negative (purchase returns)
    Unbounded,
}

impl FloorPolicy {
    /// Apply a signed delta to `current` under this policy.
    ///
    /// Results beyond [`MAX_QUANTITY`] in either direction are rejected.
    pub fn apply(self, current: Decimal, delta: Decimal) -> Result<Adjustment, LedgerError> {
        let raw = current.checked_add(delta).ok_or(LedgerError::OutOfRange)?;

        let after = match self {
            FloorPolicy::Reject if delta < Decimal::ZERO && raw < Decimal::ZERO => {
                return Err(LedgerError::InsufficientStock {
                    available: current,
                    requested: -delta,
                });
            }
            FloorPolicy::Clamp => raw.max(Decimal::ZERO),
            FloorPolicy::Reject | FloorPolicy::Unbounded => raw,
        };

        if after.abs() > MAX_QUANTITY {
            return Err(LedgerError::OutOfRange);
        }

        Ok(Adjustment {
            before: current,
            after,
            clamped: raw < after,
        })
    }
}

/// Result of a single quantity adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Adjustment {
    pub before: Decimal,
    pub after: Decimal,
    /// True when the floor swallowed part of the delta
    pub clamped: bool,
}

impl Adjustment {
    pub fn is_negative(&self) -> bool {
        self.after < Decimal::ZERO
    }
}

fn add(current: Decimal, delta: Decimal) -> Result<Decimal, LedgerError> {
    FloorPolicy::Unbounded
        .apply(current, delta)
        .map(|adjustment| adjustment.after)
}

fn bounded_amount(value: Decimal) -> Result<Decimal, LedgerError> {
    if value.abs() > MAX_AMOUNT {
        return Err(LedgerError::OutOfRange);
    }
    Ok(value)
}

/// Round a monetary value to 2 decimal places, half away from zero
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Next value of the `stock_in` column after a receipt.
///
/// An empty (null or zero) column accumulates the receipt; a populated one is
/// overwritten by it.
pub fn next_stock_in(current: Option<Decimal>, quantity_in: Decimal) -> Result<Decimal, LedgerError> {
    match current {
        Some(existing) if !existing.is_zero() => add(Decimal::ZERO, quantity_in),
        existing => add(existing.unwrap_or(Decimal::ZERO), quantity_in),
    }
}

/// Quantity columns of a raw material row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawMaterialLevels {
    pub opening_stock: Decimal,
    pub stock_in: Option<Decimal>,
    pub stock_in_production: Decimal,
    pub remaining_stock: Decimal,
}

impl RawMaterialLevels {
    /// Apply a stock-in receipt. `remaining_stock` is derived from
    /// `opening_stock + stock_in`, it is never incremented directly.
    pub fn receive(self, quantity_in: Decimal) -> Result<Self, LedgerError> {
        let stock_in = next_stock_in(self.stock_in, quantity_in)?;
        Ok(Self {
            stock_in: Some(stock_in),
            remaining_stock: add(self.opening_stock, stock_in)?,
            ..self
        })
    }

    /// Consume stock into a production run.
    ///
    /// The pre-consumption balance becomes the new `opening_stock`, the balance
    /// floors at zero and the full quantity is added to `stock_in_production`.
    pub fn consume(self, quantity_used: Decimal) -> Result<(Self, Adjustment), LedgerError> {
        let adjustment = FloorPolicy::Clamp.apply(self.remaining_stock, -quantity_used)?;
        let levels = Self {
            opening_stock: self.remaining_stock,
            remaining_stock: adjustment.after,
            stock_in_production: add(self.stock_in_production, quantity_used)?,
            ..self
        };
        Ok((levels, adjustment))
    }

    /// Send stock back to the supplier. No floor is applied.
    pub fn release_return(self, quantity: Decimal) -> Result<(Self, Adjustment), LedgerError> {
        let adjustment = FloorPolicy::Unbounded.apply(self.remaining_stock, -quantity)?;
        let levels = Self {
            remaining_stock: adjustment.after,
            ..self
        };
        Ok((levels, adjustment))
    }

    /// Undo a purchase return line
    pub fn restore_return(self, quantity: Decimal) -> Result<Self, LedgerError> {
        Ok(Self {
            remaining_stock: add(self.remaining_stock, quantity)?,
            ..self
        })
    }
}

/// Quantity columns of a finished good row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FinishedGoodLevels {
    /// Legacy mirror of `remaining_stock`
    pub initial_stock: Decimal,
    pub remaining_stock: Decimal,
}

impl FinishedGoodLevels {
    /// Levels of a finished good created by a production run
    pub fn produced(amount: Decimal) -> Self {
        Self {
            initial_stock: amount,
            remaining_stock: amount,
        }
    }

    /// Add output of a production run into an existing finished good
    pub fn produce(self, amount: Decimal) -> Result<Self, LedgerError> {
        Ok(Self {
            remaining_stock: add(self.remaining_stock, amount)?,
            ..self
        })
    }

    /// Ship goods out. Rejected when the quantity exceeds the balance.
    pub fn ship(self, quantity_out: Decimal) -> Result<Self, LedgerError> {
        let adjustment = FloorPolicy::Reject.apply(self.remaining_stock, -quantity_out)?;
        Ok(Self {
            initial_stock: add(self.initial_stock, -quantity_out)?,
            remaining_stock: adjustment.after,
        })
    }

    /// Exact inverse of [`FinishedGoodLevels::ship`]
    pub fn unship(self, quantity_out: Decimal) -> Result<Self, LedgerError> {
        Ok(Self {
            initial_stock: add(self.initial_stock, quantity_out)?,
            remaining_stock: add(self.remaining_stock, quantity_out)?,
        })
    }
}

/// Total material cost of a production run: `Σ(quantity_used × price_per_unit)`
pub fn production_cost<I>(lines: I) -> Result<Decimal, LedgerError>
where
    I: IntoIterator<Item = (Decimal, Decimal)>,
{
    lines
        .into_iter()
        .try_fold(Decimal::ZERO, |total, (quantity_used, price_per_unit)| {
            let line = quantity_used
                .checked_mul(price_per_unit)
                .ok_or(LedgerError::OutOfRange)?;
            add_amount(total, line)
        })
}

/// Price per unit of produced goods, 0 when nothing was produced
pub fn unit_cost(total_cost: Decimal, finished_amount: Decimal) -> Result<Decimal, LedgerError> {
    if finished_amount.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let per_unit = total_cost
        .checked_div(finished_amount)
        .ok_or(LedgerError::OutOfRange)?;
    bounded_amount(round2(per_unit))
}

/// Monetary total of a return or receipt line
pub fn line_total(quantity: Decimal, unit_price: Decimal) -> Result<Decimal, LedgerError> {
    let total = quantity
        .checked_mul(unit_price)
        .ok_or(LedgerError::OutOfRange)?;
    bounded_amount(round2(total))
}

/// Sum of two monetary values
pub fn add_amount(total: Decimal, amount: Decimal) -> Result<Decimal, LedgerError> {
    total
        .checked_add(amount)
        .ok_or(LedgerError::OutOfRange)
        .and_then(bounded_amount)
}

/// Default stock-out number: `SO-{outlet}-{epochMillis}`
pub fn stock_out_number(outlet_id: impl Display, epoch_millis: i64) -> String {
    format!("SO-{}-{}", outlet_id, epoch_millis)
}

/// Default purchase return number: `RET-{epochMillis}`
pub fn return_number(epoch_millis: i64) -> String {
    format!("RET-{}", epoch_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn raw(opening: &str, stock_in: Option<&str>, remaining: &str) -> RawMaterialLevels {
        RawMaterialLevels {
            opening_stock: dec(opening),
            stock_in: stock_in.map(dec),
            stock_in_production: Decimal::ZERO,
            remaining_stock: dec(remaining),
        }
    }

    #[test]
    fn test_column_limits() {
        assert_eq!(MAX_QUANTITY, dec("99999999999999.9999"));
        assert_eq!(MAX_AMOUNT, dec("9999999999999999.99"));
    }

    #[test]
    fn test_reject_policy_refuses_negative() {
        let err = FloorPolicy::Reject.apply(dec("5"), dec("-6")).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientStock {
                available: dec("5"),
                requested: dec("6"),
            }
        );
        assert!(err.to_string().starts_with(STOCK_UNAVAILABLE));
    }

    #[test]
    fn test_reject_policy_allows_exact_balance() {
        let adj = FloorPolicy::Reject.apply(dec("5"), dec("-5")).unwrap();
        assert_eq!(adj.after, Decimal::ZERO);
        assert!(!adj.clamped);
    }

    #[test]
    fn test_clamp_policy_floors_at_zero() {
        let adj = FloorPolicy::Clamp.apply(dec("3"), dec("-10")).unwrap();
        assert_eq!(adj.after, Decimal::ZERO);
        assert!(adj.clamped);
    }

    #[test]
    fn test_unbounded_policy_goes_negative() {
        let adj = FloorPolicy::Unbounded.apply(dec("2"), dec("-5")).unwrap();
        assert_eq!(adj.after, dec("-3"));
        assert!(adj.is_negative());
    }

    #[test]
    fn test_apply_rejects_results_beyond_column_range() {
        assert_eq!(
            FloorPolicy::Unbounded.apply(MAX_QUANTITY, dec("0.0001")),
            Err(LedgerError::OutOfRange)
        );
        assert_eq!(
            FloorPolicy::Unbounded.apply(Decimal::MAX, Decimal::MAX),
            Err(LedgerError::OutOfRange)
        );
    }

    #[test]
    fn test_receive_derives_remaining_from_opening() {
        let levels = raw("10", Some("0"), "10").receive(dec("20")).unwrap();
        assert_eq!(levels.stock_in, Some(dec("20")));
        assert_eq!(levels.remaining_stock, dec("30"));
    }

    #[test]
    fn test_receive_with_null_stock_in_accumulates() {
        let levels = raw("4", None, "4").receive(dec("6")).unwrap();
        assert_eq!(levels.stock_in, Some(dec("6")));
        assert_eq!(levels.remaining_stock, dec("10"));
    }

    #[test]
    fn test_receive_replaces_populated_stock_in() {
        // remaining was 25 but is recomputed from opening + the new batch
        let levels = raw("10", Some("15"), "25").receive(dec("7")).unwrap();
        assert_eq!(levels.stock_in, Some(dec("7")));
        assert_eq!(levels.remaining_stock, dec("17"));
    }

    #[test]
    fn test_consume_snapshots_opening_and_clamps() {
        let (levels, adj) = raw("1", None, "3").consume(dec("10")).unwrap();
        assert_eq!(levels.opening_stock, dec("3"));
        assert_eq!(levels.remaining_stock, Decimal::ZERO);
        assert_eq!(levels.stock_in_production, dec("10"));
        assert!(adj.clamped);
    }

    #[test]
    fn test_release_and_restore_return() {
        let start = raw("0", None, "2");
        let (after, adj) = start.release_return(dec("5")).unwrap();
        assert_eq!(after.remaining_stock, dec("-3"));
        assert!(adj.is_negative());
        assert_eq!(after.restore_return(dec("5")).unwrap(), start);
    }

    #[test]
    fn test_ship_moves_both_fields() {
        let levels = FinishedGoodLevels::produced(dec("10"));
        let shipped = levels.ship(dec("4")).unwrap();
        assert_eq!(shipped.remaining_stock, dec("6"));
        assert_eq!(shipped.initial_stock, dec("6"));
        assert_eq!(shipped.unship(dec("4")).unwrap(), levels);
    }

    #[test]
    fn test_produce_only_touches_remaining() {
        let levels = FinishedGoodLevels {
            initial_stock: dec("5"),
            remaining_stock: dec("3"),
        };
        let produced = levels.produce(dec("7")).unwrap();
        assert_eq!(produced.remaining_stock, dec("10"));
        assert_eq!(produced.initial_stock, dec("5"));
    }

    #[test]
    fn test_production_cost_scenario() {
        let total = production_cost(vec![(dec("2"), dec("1000")), (dec("3"), dec("500"))]).unwrap();
        assert_eq!(total, dec("3500"));
        assert_eq!(unit_cost(total, dec("10")).unwrap(), dec("350.00"));
        assert_eq!(unit_cost(total, Decimal::ZERO).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_unit_cost_rounds_half_away_from_zero() {
        assert_eq!(unit_cost(dec("10"), dec("3")).unwrap(), dec("3.33"));
        assert_eq!(unit_cost(dec("0.125"), dec("1")).unwrap(), dec("0.13"));
    }

    #[test]
    fn test_costing_overflow_is_an_error() {
        // Decimal::MAX × 2 and a huge total over a tiny amount would panic unchecked
        assert_eq!(
            production_cost(vec![(Decimal::MAX, dec("2"))]),
            Err(LedgerError::OutOfRange)
        );
        assert_eq!(
            unit_cost(dec("79228162514264337593543950"), dec("0.0000000001")),
            Err(LedgerError::OutOfRange)
        );
        assert_eq!(
            line_total(dec("79228162514264337593543950335"), dec("2")),
            Err(LedgerError::OutOfRange)
        );
    }

    #[test]
    fn test_amounts_beyond_column_range_are_errors() {
        assert_eq!(
            line_total(MAX_QUANTITY, MAX_AMOUNT),
            Err(LedgerError::OutOfRange)
        );
        assert_eq!(add_amount(MAX_AMOUNT, dec("0.01")), Err(LedgerError::OutOfRange));
        assert_eq!(add_amount(dec("1.25"), dec("2.50")), Ok(dec("3.75")));
    }

    #[test]
    fn test_generated_numbers() {
        assert_eq!(stock_out_number(7, 1700000000000), "SO-7-1700000000000");
        assert_eq!(return_number(1700000000000), "RET-1700000000000");
    }

    fn quantity_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=100000i64).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_ship_then_unship_is_identity(
            stock in quantity_strategy(),
            out in quantity_strategy(),
        ) {
            let levels = FinishedGoodLevels::produced(stock);
            match levels.ship(out) {
                Ok(shipped) => {
                    prop_assert!(out <= stock);
                    prop_assert_eq!(shipped.unship(out).unwrap(), levels);
                }
                Err(_) => prop_assert!(out > stock),
            }
        }

        #[test]
        fn prop_consume_never_negative(
            remaining in quantity_strategy(),
            used in quantity_strategy(),
        ) {
            let (levels, _) = raw("0", None, "0")
                .restore_return(remaining)
                .unwrap()
                .consume(used)
                .unwrap();
            prop_assert!(levels.remaining_stock >= Decimal::ZERO);
            prop_assert_eq!(levels.stock_in_production, used);
        }

        #[test]
        fn prop_release_restore_round_trip(
            remaining in quantity_strategy(),
            qty in quantity_strategy(),
        ) {
            let start = raw("0", None, "0").restore_return(remaining).unwrap();
            let (after, _) = start.release_return(qty).unwrap();
            prop_assert_eq!(after.remaining_stock, remaining - qty);
            prop_assert_eq!(after.restore_return(qty).unwrap(), start);
        }

        #[test]
        fn prop_costing_never_panics(
            quantity in -(1i64 << 62)..(1i64 << 62),
            price in -(1i64 << 62)..(1i64 << 62),
            scale in 0u32..=28,
        ) {
            let quantity = Decimal::new(quantity, scale);
            let price = Decimal::new(price, 0);
            let _ = line_total(quantity, price);
            if let Ok(total) = production_cost(vec![(quantity, price), (quantity, price)]) {
                prop_assert!(total.abs() <= MAX_AMOUNT);
                let _ = unit_cost(total, Decimal::new(1, 10));
            }
        }
    }
}
