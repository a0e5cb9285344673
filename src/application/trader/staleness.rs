//! Position staleness scoring (spec §4.5), a pure-function scorer grounded
//! in the teacher's `domain/performance/calculator.rs` style (derived, no
//! running state).

use crate::config::Config;

#[derive(Debug, Clone, Copy)]
pub struct StalenessInput {
    pub hold_hours: f64,
    pub pl_pct: f64,
    pub entry_volume: u64,
    pub current_volume: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct StalenessScore {
    pub score: f64,
    pub stale: bool,
}

/// Compute the [0,100] staleness score for a held position (spec §4.5).
/// Only applies once `hold_hours >= stale_min_hold_hours`.
pub fn score(input: StalenessInput, cfg: &Config) -> StalenessScore {
    if input.hold_hours < cfg.stale_min_hold_hours {
        return StalenessScore {
            score: 0.0,
            stale: false,
        };
    }

    let hold_days = input.hold_hours / 24.0;

    // Time component: 0 at stale_mid_hold_days, 40 at stale_max_hold_days,
    // linearly interpolated.
    let time_score = if hold_days >= cfg.stale_max_hold_days {
        40.0
    } else if hold_days <= cfg.stale_mid_hold_days {
        0.0
    } else {
        let span = (cfg.stale_max_hold_days - cfg.stale_mid_hold_days).max(1e-9);
        40.0 * (hold_days - cfg.stale_mid_hold_days) / span
    };

    // Price component.
    let price_score = if input.pl_pct < 0.0 {
        (input.pl_pct.abs() * 3.0).min(30.0)
    } else if input.pl_pct < cfg.stale_mid_min_gain_pct && hold_days >= cfg.stale_mid_hold_days {
        15.0
    } else {
        0.0
    };

    // Social decay component.
    let ratio = if input.entry_volume == 0 {
        1.0
    } else {
        input.current_volume as f64 / input.entry_volume as f64
    };
    let social_score = if ratio <= cfg.stale_social_volume_decay {
        30.0
    } else if ratio <= 0.5 {
        15.0
    } else {
        0.0
    };

    let total = (time_score + price_score + social_score).min(100.0);

    let stale = total >= cfg.stale_score_threshold
        || (hold_days >= cfg.stale_max_hold_days && input.pl_pct < cfg.stale_min_gain_pct);

    StalenessScore { score: total, stale }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> Config {
        let mut c = Config::from_env().unwrap();
        c.stale_min_hold_hours = 24.0;
        c.stale_mid_hold_days = 3.0;
        c.stale_max_hold_days = 10.0;
        c.stale_mid_min_gain_pct = 5.0;
        c.stale_min_gain_pct = 10.0;
        c.stale_social_volume_decay = 0.25;
        c.stale_score_threshold = 70.0;
        c
    }

    #[test]
    fn below_min_hold_is_never_stale() {
        let input = StalenessInput {
            hold_hours: 10.0,
            pl_pct: -50.0,
            entry_volume: 100,
            current_volume: 1,
        };
        let s = score(input, &cfg());
        assert_eq!(s.score, 0.0);
        assert!(!s.stale);
    }

    #[test]
    fn heavy_loss_and_social_decay_triggers_stale() {
        let input = StalenessInput {
            hold_hours: 24.0 * 5.0,
            pl_pct: -15.0,
            entry_volume: 100,
            current_volume: 10,
        };
        let s = score(input, &cfg());
        assert!(s.stale);
    }

    #[test]
    fn long_hold_low_gain_is_stale_even_at_low_score() {
        let input = StalenessInput {
            hold_hours: 24.0 * 11.0,
            pl_pct: 2.0,
            entry_volume: 100,
            current_volume: 100,
        };
        let s = score(input, &cfg());
        assert!(s.stale);
    }
}
