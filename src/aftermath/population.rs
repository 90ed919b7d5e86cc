//! Civilian impact of a battle fought at a city

/// Population and trust after `casualties`
///
/// Population drops by 60% of the casualties; trust drops by one point per
/// thousand casualties, at most 20, and stays within 0..=100.
pub fn calculate_population_trust(population: u64, trust: u32, casualties: u64) -> (u64, u32) {
    let population = population.saturating_sub(casualties.saturating_mul(60) / 100);
    let drop = (casualties / 1_000).min(20) as u32;
    let trust = trust.min(100).saturating_sub(drop);
    (population, trust)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reference_scenario() {
        assert_eq!(calculate_population_trust(100_000, 70, 5_000), (97_000, 65));
    }

    #[test]
    fn test_trust_drop_is_capped() {
        let (pop, trust) = calculate_population_trust(1_000_000, 70, 999_999);
        assert_eq!(pop, 400_001);
        assert_eq!(trust, 50);
    }

    #[test]
    fn test_floors_at_zero() {
        assert_eq!(calculate_population_trust(100, 5, 50_000), (0, 0));
        assert_eq!(calculate_population_trust(0, 0, 0), (0, 0));
    }

    proptest! {
        #[test]
        fn prop_bounds(
            pop in 0u64..10_000_000,
            trust in 0u32..200,
            casualties in 0u64..10_000_000,
        ) {
            let (p, t) = calculate_population_trust(pop, trust, casualties);
            prop_assert!(p <= pop);
            prop_assert!(t <= 100);
            prop_assert!(trust.min(100) - t <= 20);
        }
    }
}
