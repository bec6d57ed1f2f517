use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::AgriRoiError;
use crate::types::{Money, Rate};
use crate::AgriRoiResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;

/// (1+r)^t by iterative multiplication, so whole-year factors stay exact in
/// Decimal. `None` once the product leaves the representable range.
pub fn checked_growth_factor(rate: Rate, periods: u32) -> Option<Decimal> {
    let growth = Decimal::ONE + rate;
    let mut factor = Decimal::ONE;
    for _ in 0..periods {
        factor = factor.checked_mul(growth)?;
    }
    Some(factor)
}

/// Reciprocal of a growth factor. An overflowed growth factor discounts to
/// zero; an underflowed one saturates at `Decimal::MAX`.
fn reciprocal(growth: Option<Decimal>) -> Decimal {
    match growth {
        Some(factor) if factor.is_zero() => Decimal::MAX,
        Some(factor) => Decimal::ONE.checked_div(factor).unwrap_or(Decimal::MAX),
        None => Decimal::ZERO,
    }
}

/// Discount factor (1+r)^(-t).
pub fn discount_factor(rate: Rate, periods: u32) -> Decimal {
    if periods == 0 || rate.is_zero() {
        return Decimal::ONE;
    }
    reciprocal(checked_growth_factor(rate, periods))
}

/// Present value of 1 received at the end of each of `periods` years.
pub fn annuity_factor(rate: Rate, periods: u32) -> Decimal {
    if rate.is_zero() {
        return Decimal::from(periods);
    }
    let growth = Decimal::ONE + rate;
    let mut compounded = Some(Decimal::ONE);
    let mut total = Decimal::ZERO;
    for _ in 0..periods {
        compounded = compounded.and_then(|f| f.checked_mul(growth));
        // Every later year discounts to zero as well
        if compounded.is_none() {
            break;
        }
        total = total.saturating_add(reciprocal(compounded));
    }
    total
}

/// Future value of 1 paid at the end of each of `periods` years and
/// compounded at `rate` until the last one. Saturates at `Decimal::MAX`.
pub fn future_value_annuity_factor(rate: Rate, periods: u32) -> Decimal {
    if rate.is_zero() {
        return Decimal::from(periods);
    }
    checked_growth_factor(rate, periods)
        .and_then(|growth| (growth - Decimal::ONE).checked_div(rate))
        .unwrap_or(Decimal::MAX)
}

/// Net Present Value of a series of cash flows, the first at t = 0.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> AgriRoiResult<Money> {
    if rate <= dec!(-1) {
        return Err(AgriRoiError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            match discount.checked_mul(one_plus_r) {
                Some(next) => discount = next,
                // Later flows discount to nothing
                None => break,
            }
        }
        let term = cf
            .checked_div(discount)
            .ok_or_else(|| AgriRoiError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            })?;
        result = result.saturating_add(term);
    }

    Ok(result)
}

/// Internal Rate of Return using Newton-Raphson
pub fn irr(cash_flows: &[Money], guess: Rate) -> AgriRoiResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(AgriRoiError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let mut rate = guess;

    for i in 0..MAX_IRR_ITERATIONS {
        let mut npv_val = Decimal::ZERO;
        let mut dnpv = Decimal::ZERO;
        let one_plus_r = Decimal::ONE + rate;

        // Decimal overflow means the iterate has run away
        let diverged = move || AgriRoiError::ConvergenceFailure {
            function: "IRR".into(),
            iterations: i,
            last_delta: Decimal::MAX,
        };

        for (t, cf) in cash_flows.iter().enumerate() {
            let t_dec = Decimal::from(t as i64);
            let discount = one_plus_r.checked_powd(t_dec).ok_or_else(diverged)?;
            if discount.is_zero() {
                continue;
            }
            let term = cf.checked_div(discount).ok_or_else(diverged)?;
            npv_val = npv_val.checked_add(term).ok_or_else(diverged)?;
            if t > 0 {
                let slope = t_dec
                    .checked_mul(*cf)
                    .ok_or_else(diverged)?
                    .checked_div(discount.checked_mul(one_plus_r).ok_or_else(diverged)?)
                    .ok_or_else(diverged)?;
                dnpv = dnpv.checked_sub(slope).ok_or_else(diverged)?;
            }
        }

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return Ok(rate);
        }

        if dnpv.is_zero() {
            return Err(AgriRoiError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: npv_val,
            });
        }

        rate -= npv_val.checked_div(dnpv).ok_or_else(diverged)?;

        // Guard against divergence
        if rate < dec!(-0.99) {
            rate = dec!(-0.99);
        } else if rate > dec!(100.0) {
            rate = dec!(100.0);
        }
    }

    Err(AgriRoiError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta: npv(rate, cash_flows).unwrap_or(Decimal::MAX),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(1.0));
    }

    #[test]
    fn test_irr_basic() {
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let result = irr(&cfs, dec!(0.10)).unwrap();
        // IRR should be ~9.7%
        assert!((result - dec!(0.097)).abs() < dec!(0.01));
    }

    #[test]
    fn test_annuity_factor_matches_npv() {
        let cfs = vec![dec!(0), dec!(100), dec!(100), dec!(100), dec!(100), dec!(100)];
        let by_npv = npv(dec!(0.08), &cfs).unwrap();
        let by_factor = dec!(100) * annuity_factor(dec!(0.08), 5);
        assert!((by_npv - by_factor).abs() < dec!(0.000001));
        // 100 * 3.99271 ≈ 399.27
        assert!((by_factor - dec!(399.27)).abs() < dec!(0.01));
    }

    #[test]
    fn test_future_value_annuity_factor() {
        // (1.08^5 - 1) / 0.08 = 5.86660...
        let f = future_value_annuity_factor(dec!(0.08), 5);
        assert!((f - dec!(5.8666)).abs() < dec!(0.0001));
        assert_eq!(future_value_annuity_factor(Decimal::ZERO, 5), dec!(5));
    }

    #[test]
    fn test_discount_factor_zero_periods() {
        assert_eq!(discount_factor(dec!(0.08), 0), Decimal::ONE);
    }

    #[test]
    fn test_overflowing_growth_discounts_to_zero() {
        // 51^20 is far beyond Decimal range
        assert_eq!(checked_growth_factor(dec!(50), 20), None);
        assert_eq!(discount_factor(dec!(50), 20), Decimal::ZERO);
        assert_eq!(future_value_annuity_factor(dec!(50), 20), Decimal::MAX);
        // Only the early years contribute: 1/51 + 1/51^2 + ...
        let af = annuity_factor(dec!(50), 20);
        assert!((af - dec!(0.02)).abs() < dec!(0.0001), "af={af}");
    }

    #[test]
    fn test_long_horizon_annuity_converges_to_perpetuity() {
        // 1000 years at 8% approaches 1 / 0.08
        let af = annuity_factor(dec!(0.08), 1000);
        assert!((af - dec!(12.5)).abs() < dec!(0.0001), "af={af}");
    }

    #[test]
    fn test_irr_does_not_panic_on_explosive_flows() {
        let mut cfs = vec![dec!(-0.0001)];
        cfs.extend(std::iter::repeat(dec!(1000000)).take(100));
        // Either a clamped root or a convergence failure, never a panic
        let _ = irr(&cfs, dec!(0.10));
    }
}
