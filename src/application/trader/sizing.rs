//! Equity/crypto buy sizing and order invariants (spec §4.4 "Buy sizing").

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::config::Config;
use crate::domain::errors::TradingError;

/// `size = min(cash * sizePct * confidence * crisis_mult, max_position_value
/// * crisis_mult)` where `sizePct = min(20, position_size_pct_of_cash)`
/// (spec §4.4).
pub fn buy_size(cash: Decimal, confidence: f64, crisis_mult: f64, cfg: &Config) -> Decimal {
    let size_pct = cfg.position_size_pct_of_cash.min(20.0) / 100.0;
    let confidence_factor = Decimal::from_f64(confidence * crisis_mult).unwrap_or(Decimal::ZERO);
    let size_pct_decimal = Decimal::from_f64(size_pct).unwrap_or(Decimal::ZERO);
    let from_cash = cash * size_pct_decimal * confidence_factor;
    let cap = Decimal::from_f64(cfg.max_position_value * crisis_mult).unwrap_or(Decimal::ZERO);
    from_cash.min(cap)
}

/// Validate the invariants every buy order must satisfy before submission
/// (spec §4.4, §8 invariant 8).
pub fn validate_buy(
    symbol: &str,
    cash: Decimal,
    size: Decimal,
    confidence: f64,
    cfg: &Config,
) -> Result<(), TradingError> {
    if symbol.is_empty() {
        return Err(TradingError::InvalidOrder {
            symbol: symbol.to_string(),
            reason: "empty symbol".into(),
        });
    }
    if cash <= Decimal::ZERO {
        return Err(TradingError::InsufficientCash {
            need: size,
            available: cash,
        });
    }
    if !(0.0..=1.0).contains(&confidence) || confidence == 0.0 {
        return Err(TradingError::InvalidOrder {
            symbol: symbol.to_string(),
            reason: format!("confidence {confidence} out of (0,1]"),
        });
    }
    let max_allowed = Decimal::from_f64(cfg.max_position_value * 1.01).unwrap_or(Decimal::ZERO);
    if !(size > Decimal::ZERO && size <= max_allowed) {
        return Err(TradingError::InvalidOrder {
            symbol: symbol.to_string(),
            reason: format!("size {size} out of (0, {max_allowed}]"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn cfg() -> Config {
        let mut c = Config::from_env().unwrap();
        c.position_size_pct_of_cash = 10.0;
        c.max_position_value = 2000.0;
        c
    }

    #[test]
    fn buy_size_respects_cap() {
        let size = buy_size(dec!(100_000), 1.0, 1.0, &cfg());
        assert_eq!(size, dec!(2000));
    }

    #[test]
    fn buy_size_scales_with_confidence_and_crisis_mult() {
        let size = buy_size(dec!(10_000), 0.5, 0.5, &cfg());
        // from_cash = 10000 * 0.10 * 0.25 = 250; cap = 2000*0.5=1000 -> min = 250
        assert_eq!(size, dec!(250));
    }

    #[test]
    fn validate_buy_rejects_empty_symbol() {
        let err = validate_buy("", dec!(1000), dec!(100), 0.8, &cfg());
        assert!(err.is_err());
    }

    #[test]
    fn validate_buy_rejects_oversized_order() {
        let err = validate_buy("AAPL", dec!(1000), dec!(5000), 0.8, &cfg());
        assert!(err.is_err());
    }

    #[test]
    fn validate_buy_accepts_sane_order() {
        let ok = validate_buy("AAPL", dec!(1000), dec!(500), 0.8, &cfg());
        assert!(ok.is_ok());
    }
}
