//! Crisis monitor domain types (spec §3 "CrisisState", §4.6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum CrisisLevel {
    Normal = 0,
    Elevated = 1,
    HighAlert = 2,
    FullCrisis = 3,
}

impl CrisisLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=1 => CrisisLevel::Normal,
            2..=3 => CrisisLevel::Elevated,
            4..=5 => CrisisLevel::HighAlert,
            _ => CrisisLevel::FullCrisis,
        }
    }

    /// Position size multiplier for new entries at this level (spec §4.6).
    pub fn position_multiplier(self) -> f64 {
        match self {
            CrisisLevel::Normal => 1.0,
            CrisisLevel::Elevated => 0.5,
            CrisisLevel::HighAlert | CrisisLevel::FullCrisis => 0.0,
        }
    }

    pub fn blocks_new_entries(self) -> bool {
        matches!(self, CrisisLevel::HighAlert | CrisisLevel::FullCrisis)
    }

    pub fn forces_liquidation(self) -> bool {
        self == CrisisLevel::FullCrisis
    }
}

impl std::fmt::Display for CrisisLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CrisisLevel::Normal => "normal",
            CrisisLevel::Elevated => "elevated",
            CrisisLevel::HighAlert => "high_alert",
            CrisisLevel::FullCrisis => "full_crisis",
        };
        write!(f, "{s}")
    }
}

/// Macro indicator snapshot. `stocks_above_200ma` is permanently allowed to
/// be `None` (spec §9 open question: source is unsourced/`TODO` upstream);
/// crisis scoring tolerates that by contributing zero points for it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Indicators {
    pub vix: Option<f64>,
    pub hy_spread: Option<f64>,
    pub yield_curve_2y10y: Option<f64>,
    pub ted_spread: Option<f64>,
    pub btc_price: Option<f64>,
    pub btc_weekly_pct: Option<f64>,
    pub usdt_peg: Option<f64>,
    pub dxy: Option<f64>,
    pub usdjpy: Option<f64>,
    pub kre: Option<f64>,
    pub kre_weekly_pct: Option<f64>,
    pub gold_silver_ratio: Option<f64>,
    pub silver_weekly_pct: Option<f64>,
    pub stocks_above_200ma: Option<f64>,
    pub fed_balance_sheet: Option<f64>,
    pub fed_change_pct: Option<f64>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrisisState {
    pub level: CrisisLevel,
    pub indicators: Indicators,
    pub triggered_indicators: Vec<String>,
    pub paused_until: Option<DateTime<Utc>>,
    pub last_level_change: DateTime<Utc>,
    pub positions_closed_in_crisis: Vec<String>,
    pub manual_override: bool,
}

impl Default for CrisisState {
    fn default() -> Self {
        Self {
            level: CrisisLevel::Normal,
            indicators: Indicators::default(),
            triggered_indicators: Vec::new(),
            paused_until: None,
            last_level_change: Utc::now(),
            positions_closed_in_crisis: Vec::new(),
            manual_override: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_thresholds_match_spec_table() {
        assert_eq!(CrisisLevel::from_score(0), CrisisLevel::Normal);
        assert_eq!(CrisisLevel::from_score(1), CrisisLevel::Normal);
        assert_eq!(CrisisLevel::from_score(2), CrisisLevel::Elevated);
        assert_eq!(CrisisLevel::from_score(3), CrisisLevel::Elevated);
        assert_eq!(CrisisLevel::from_score(4), CrisisLevel::HighAlert);
        assert_eq!(CrisisLevel::from_score(5), CrisisLevel::HighAlert);
        assert_eq!(CrisisLevel::from_score(6), CrisisLevel::FullCrisis);
        assert_eq!(CrisisLevel::from_score(100), CrisisLevel::FullCrisis);
    }

    #[test]
    fn full_crisis_forces_liquidation_and_zero_mult() {
        assert!(CrisisLevel::FullCrisis.forces_liquidation());
        assert_eq!(CrisisLevel::FullCrisis.position_multiplier(), 0.0);
    }
}
