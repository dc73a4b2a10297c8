//! Weighted reward tables and wager draws.
//!
//! Every function here is pure over an injected uniform sample in
//! `[0, 100)`; the caller owns the RNG. Tables are cumulative-probability
//! ladders with lower point values carrying more mass.

use honor_types::CoinSide;

/// Daily check-in: 1-10 points.
/// 1 (30%), 2 (20%), 3 (15%), 4 (12%), 5 (10%), 6 (6%), 7 (4%), 8 (2%),
/// 9 (0.5%), 10 (0.5%).
const CHECKIN_TABLE: [(f64, u64); 10] = [
    (30.0, 1),
    (50.0, 2),
    (65.0, 3),
    (77.0, 4),
    (87.0, 5),
    (93.0, 6),
    (97.0, 7),
    (99.0, 8),
    (99.5, 9),
    (100.0, 10),
];

/// Message activity: 1-5 points.
/// 1 (80%), 2 (10%), 3 (5%), 4 (3%), 5 (2%).
const MESSAGE_TABLE: [(f64, u64); 5] = [
    (80.0, 1),
    (90.0, 2),
    (95.0, 3),
    (98.0, 4),
    (100.0, 5),
];

fn points_from_table(table: &[(f64, u64)], roll: f64) -> u64 {
    for (threshold, points) in table {
        if roll < *threshold {
            return *points;
        }
    }
    // roll is < 100 by contract; the last threshold is 100, so this only
    // covers out-of-contract input.
    table.last().map(|(_, points)| *points).unwrap_or(1)
}

/// Map one uniform `[0, 100)` sample to a check-in reward.
pub fn checkin_points(roll: f64) -> u64 {
    points_from_table(&CHECKIN_TABLE, roll)
}

/// Map one uniform `[0, 100)` sample to a message reward.
pub fn message_points(roll: f64) -> u64 {
    points_from_table(&MESSAGE_TABLE, roll)
}

/// Fair coin: the lower half of the sample space lands heads.
pub fn coin_side(roll: f64) -> CoinSide {
    if roll < 50.0 {
        CoinSide::Heads
    } else {
        CoinSide::Tails
    }
}

/// Asymmetric draw for the fixed-odds wager variant.
pub fn fixed_odds_win(roll: f64, win_percent: f64) -> bool {
    roll < win_percent
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_checkin_table_thresholds() {
        assert_eq!(checkin_points(0.0), 1);
        assert_eq!(checkin_points(29.999), 1);
        assert_eq!(checkin_points(30.0), 2);
        assert_eq!(checkin_points(64.999), 3);
        assert_eq!(checkin_points(77.0), 5);
        assert_eq!(checkin_points(92.999), 6);
        assert_eq!(checkin_points(98.999), 8);
        assert_eq!(checkin_points(99.0), 9);
        assert_eq!(checkin_points(99.5), 10);
        assert_eq!(checkin_points(99.999), 10);
    }

    #[test]
    fn test_message_table_thresholds() {
        assert_eq!(message_points(0.0), 1);
        assert_eq!(message_points(79.999), 1);
        assert_eq!(message_points(80.0), 2);
        assert_eq!(message_points(89.999), 2);
        assert_eq!(message_points(90.0), 3);
        assert_eq!(message_points(95.0), 4);
        assert_eq!(message_points(98.0), 5);
        assert_eq!(message_points(99.999), 5);
    }

    #[test]
    fn test_coin_side_split() {
        assert_eq!(coin_side(0.0), CoinSide::Heads);
        assert_eq!(coin_side(49.999), CoinSide::Heads);
        assert_eq!(coin_side(50.0), CoinSide::Tails);
        assert_eq!(coin_side(99.999), CoinSide::Tails);
    }

    #[test]
    fn test_fixed_odds_threshold() {
        assert!(fixed_odds_win(59.999, 60.0));
        assert!(!fixed_odds_win(60.0, 60.0));
    }

    #[test]
    fn test_message_distribution_conformance() {
        // 100k seeded draws; empirical frequencies must sit within one
        // percentage point of {80, 10, 5, 3, 2}.
        let mut rng = StdRng::seed_from_u64(7);
        let mut counts = [0u64; 5];
        const N: u64 = 100_000;
        for _ in 0..N {
            let roll: f64 = rng.gen_range(0.0..100.0);
            counts[(message_points(roll) - 1) as usize] += 1;
        }
        let expected = [80.0, 10.0, 5.0, 3.0, 2.0];
        for (value, (&count, &pct)) in counts.iter().zip(expected.iter()).enumerate() {
            let actual = count as f64 * 100.0 / N as f64;
            assert!(
                (actual - pct).abs() < 1.0,
                "value {} occurred {actual:.2}%, expected {pct}%",
                value + 1
            );
        }
    }

    #[test]
    fn test_checkin_distribution_conformance() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut counts = [0u64; 10];
        const N: u64 = 100_000;
        for _ in 0..N {
            let roll: f64 = rng.gen_range(0.0..100.0);
            counts[(checkin_points(roll) - 1) as usize] += 1;
        }
        let expected = [30.0, 20.0, 15.0, 12.0, 10.0, 6.0, 4.0, 2.0, 0.5, 0.5];
        for (value, (&count, &pct)) in counts.iter().zip(expected.iter()).enumerate() {
            let actual = count as f64 * 100.0 / N as f64;
            assert!(
                (actual - pct).abs() < 1.0,
                "value {} occurred {actual:.2}%, expected {pct}%",
                value + 1
            );
        }
    }
}
