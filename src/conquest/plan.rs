//! Pure conquest planning
//!
//! No I/O happens here; `resolve_conquest` loads the inputs, plans, and
//! persists the plan.

use crate::core::config::BattleConfig;
use crate::core::error::ValidationError;
use crate::core::types::{CityId, NationId};
use crate::random::RealmRng;
use crate::world::{City, General, Nation, NationDelta, WorldMap};

/// Everything conquest planning reads
#[derive(Debug, Clone, Copy)]
pub struct ConquestInput<'a> {
    pub attacker: &'a General,
    pub city: &'a City,
    /// Owner of the city before the battle; `None` for an unowned city
    pub defender: Option<&'a Nation>,
    /// Every city the defender held before the loss, the contested one included
    pub defender_cities: &'a [City],
}

/// Capital move forced by losing the capital
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapitalRelocation {
    pub nation: NationId,
    pub from: CityId,
    /// `None` when no owned city was reachable
    pub to: Option<CityId>,
    /// Displacement penalty: both treasuries halved
    pub penalty: NationDelta,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConquestPlan {
    pub previous_owner: NationId,
    pub new_owner: NationId,
    /// The contested city after the reset
    pub city: City,
    pub actor_moves: bool,
    pub nation_destroyed: bool,
    pub relocation: Option<CapitalRelocation>,
}

/// Highest conflict score wins, earliest contestant on ties; attacker when nobody contested
pub fn resolve_owner(city: &City, attacker_nation: NationId) -> NationId {
    city.conflict.leader().unwrap_or(attacker_nation)
}

/// Post-conquest city state
pub fn reset_city(city: &City, new_owner: NationId, config: &BattleConfig) -> City {
    let mut city = city.clone();
    city.agriculture.scale_percent(70);
    city.commerce.scale_percent(70);
    city.security.scale_percent(70);

    if city.level <= config.small_city_level_max {
        let (defense, wall) = (city.defense.max / 2, city.wall.max / 2);
        city.defense.reset_to(defense);
        city.wall.reset_to(wall);
    } else {
        city.defense.reset_to(config.large_city_defense);
        city.wall.reset_to(config.large_city_wall);
    }

    city.conflict.clear();
    city.nation = new_owner;
    city.officers.clear();
    city
}

/// Nearest owned city to the lost capital, most populous within the nearest ring
///
/// `candidates` are the cities the nation still holds. Equal populations at
/// the winning distance are settled by one draw from `rng`; without a tie
/// nothing is drawn.
pub fn relocate_capital(
    map: &dyn WorldMap,
    lost: CityId,
    candidates: &[City],
    max_distance: u32,
    rng: &mut dyn RealmRng,
) -> Option<CityId> {
    let distances = map.distances_from(lost, max_distance);

    let mut nearest: Option<u32> = None;
    for city in candidates {
        if city.id == lost {
            continue;
        }
        if let Some(&d) = distances.get(&city.id) {
            if d > 0 && nearest.map_or(true, |n| d < n) {
                nearest = Some(d);
            }
        }
    }
    let ring = nearest?;

    let mut best: Vec<&City> = Vec::new();
    for city in candidates {
        if city.id == lost || distances.get(&city.id) != Some(&ring) {
            continue;
        }
        match best.first().map(|c| c.population) {
            Some(top) if city.population < top => {}
            Some(top) if city.population == top => best.push(city),
            _ => best = vec![city],
        }
    }

    match best.len() {
        0 => None,
        1 => Some(best[0].id),
        _ => {
            best.sort_by_key(|c| c.id);
            let index = rng.next_int(best.len() as u64) as usize;
            Some(best[index].id)
        }
    }
}

/// Plan the takeover of `input.city`
pub fn plan_conquest(
    input: ConquestInput<'_>,
    map: &dyn WorldMap,
    config: &BattleConfig,
    rng: &mut dyn RealmRng,
) -> Result<ConquestPlan, ValidationError> {
    let attacker_nation = input.attacker.nation;
    if attacker_nation.is_neutral() {
        return Err(ValidationError::MissingConquestState("an affiliated attacker"));
    }
    if input.city.nation == attacker_nation {
        return Err(ValidationError::MissingConquestState(
            "a city not already held by the attacker",
        ));
    }
    let previous_owner = input.city.nation;
    if let Some(defender) = input.defender {
        if defender.id != previous_owner {
            return Err(ValidationError::MissingConquestState("the city's owning nation"));
        }
    }

    let new_owner = resolve_owner(input.city, attacker_nation);
    let city = reset_city(input.city, new_owner, config);

    let mut nation_destroyed = false;
    let mut relocation = None;

    if let Some(defender) = input.defender.filter(|_| new_owner != previous_owner) {
        let remaining: Vec<City> = input
            .defender_cities
            .iter()
            .filter(|c| c.nation == defender.id && c.id != input.city.id)
            .cloned()
            .collect();

        if remaining.is_empty() {
            nation_destroyed = true;
        } else if defender.capital == Some(input.city.id) {
            let depth = config.capital_search_depth;
            let to = relocate_capital(map, input.city.id, &remaining, depth, rng);
            let t = defender.treasury;
            let penalty = NationDelta {
                gold: -((t.gold - t.gold / 2) as i64),
                rice: -((t.rice - t.rice / 2) as i64),
                ..Default::default()
            };
            relocation = Some(CapitalRelocation {
                nation: defender.id,
                from: input.city.id,
                to,
                penalty,
            });
        }
    }

    Ok(ConquestPlan {
        previous_owner,
        new_owner,
        city,
        actor_moves: new_owner == attacker_nation,
        nation_destroyed,
        relocation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::GeneralId;
    use crate::random::{derive_seed, DeterministicStream, GuardRng};
    use crate::world::CityGraph;

    const ATK: NationId = NationId(1);
    const DEF: NationId = NationId(2);

    fn attacker() -> General {
        General::new(GeneralId(1), "Cao Cao", ATK, CityId(100))
    }

    #[test]
    fn test_owner_defaults_to_attacker() {
        let city = City::new(CityId(1), "Xu", DEF, 5);
        assert_eq!(resolve_owner(&city, ATK), ATK);
    }

    #[test]
    fn test_owner_tie_goes_to_first_contestant() {
        let mut city = City::new(CityId(1), "Xu", DEF, 5);
        city.conflict.add(NationId(5), 300);
        city.conflict.add(NationId(3), 300);
        city.conflict.add(ATK, 100);
        assert_eq!(resolve_owner(&city, ATK), NationId(5));
    }

    #[test]
    fn test_reset_small_city() {
        let mut city = City::new(CityId(1), "Xu", DEF, 3);
        city.agriculture.current = 1_001;
        city.conflict.add(ATK, 50);
        city.officers.push(GeneralId(9));

        let reset = reset_city(&city, ATK, &BattleConfig::default());
        assert_eq!(reset.agriculture.current, 700);
        assert_eq!(reset.commerce.current, 700);
        assert_eq!(reset.defense.current, 1_000);
        assert_eq!(reset.wall.current, 1_000);
        assert!(reset.conflict.is_empty());
        assert!(reset.officers.is_empty());
        assert_eq!(reset.nation, ATK);
    }

    #[test]
    fn test_reset_large_city_uses_baseline() {
        let mut city = City::new(CityId(1), "Luoyang", DEF, 8);
        city.defense = crate::world::Track::new(100, 5_000);
        city.wall = crate::world::Track::new(100, 5_000);
        let config = BattleConfig {
            large_city_defense: 1_500,
            large_city_wall: 1_200,
            ..Default::default()
        };

        let reset = reset_city(&city, ATK, &config);
        assert_eq!(reset.defense.current, 1_500);
        assert_eq!(reset.wall.current, 1_200);
    }

    #[test]
    fn test_nearest_ring_beats_larger_city() {
        // 1 -- 2(A:500), 1 -- 3(B:800), 2 -- 4(C:5000)
        let map = CityGraph::from_edges(&[(1, 2), (1, 3), (2, 4)]);
        let candidates = vec![
            City::new(CityId(2), "A", DEF, 5).with_population(500),
            City::new(CityId(3), "B", DEF, 5).with_population(800),
            City::new(CityId(4), "C", DEF, 5).with_population(5_000),
        ];
        let mut guard = GuardRng::new("capital relocation without ties");
        assert_eq!(relocate_capital(&map, CityId(1), &candidates, 99, &mut guard), Some(CityId(3)));
    }

    #[test]
    fn test_relocation_ties_are_reproducible() {
        let map = CityGraph::from_edges(&[(1, 2), (1, 3)]);
        let candidates = vec![
            City::new(CityId(2), "A", DEF, 5).with_population(800),
            City::new(CityId(3), "B", DEF, 5).with_population(800),
        ];
        let pick = |seed_id: u32| {
            let seed = derive_seed("RelocateCapital", &[seed_id.into()]);
            let mut rng = DeterministicStream::new(seed);
            relocate_capital(&map, CityId(1), &candidates, 99, &mut rng)
        };
        let first = pick(7);
        assert!(first == Some(CityId(2)) || first == Some(CityId(3)));
        assert_eq!(first, pick(7));
    }

    #[test]
    fn test_unreachable_capital_is_unset() {
        let map = CityGraph::from_edges(&[(1, 2)]);
        let candidates = vec![City::new(CityId(9), "Island", DEF, 5)];
        let mut guard = GuardRng::new("unreachable capital");
        assert_eq!(relocate_capital(&map, CityId(1), &candidates, 99, &mut guard), None);
    }

    #[test]
    fn test_search_depth_limit() {
        let map = CityGraph::from_edges(&[(1, 2), (2, 3), (3, 4)]);
        let candidates = vec![City::new(CityId(4), "Far", DEF, 5)];
        let mut guard = GuardRng::new("depth limit");
        assert_eq!(relocate_capital(&map, CityId(1), &candidates, 2, &mut guard), None);
        assert_eq!(relocate_capital(&map, CityId(1), &candidates, 3, &mut guard), Some(CityId(4)));
    }

    #[test]
    fn test_plan_capital_loss() {
        let map = CityGraph::from_edges(&[(1, 2), (2, 3)]);
        let capital = City::new(CityId(1), "Capital", DEF, 7);
        let cities = vec![
            capital.clone(),
            City::new(CityId(2), "Near", DEF, 5).with_population(100),
            City::new(CityId(3), "Far", DEF, 5).with_population(90_000),
        ];
        let defender = Nation::new(DEF, "Shu").with_capital(CityId(1)).with_treasury(1_001, 500);
        let atk = attacker();
        let input = ConquestInput {
            attacker: &atk,
            city: &capital,
            defender: Some(&defender),
            defender_cities: &cities,
        };

        let mut guard = GuardRng::new("plan without ties");
        let plan = plan_conquest(input, &map, &BattleConfig::default(), &mut guard).unwrap();
        assert_eq!(plan.new_owner, ATK);
        assert!(plan.actor_moves);
        assert!(!plan.nation_destroyed);
        let relocation = plan.relocation.unwrap();
        assert_eq!(relocation.to, Some(CityId(2)));
        assert_eq!(relocation.penalty.gold, -501);
        assert_eq!(relocation.penalty.rice, -250);
    }

    #[test]
    fn test_plan_last_city_destroys_nation() {
        let map = CityGraph::new();
        let city = City::new(CityId(1), "Last", DEF, 2);
        let cities = vec![city.clone()];
        let defender = Nation::new(DEF, "Yuan").with_capital(CityId(1));
        let atk = attacker();
        let input = ConquestInput {
            attacker: &atk,
            city: &city,
            defender: Some(&defender),
            defender_cities: &cities,
        };

        let mut guard = GuardRng::new("destruction");
        let plan = plan_conquest(input, &map, &BattleConfig::default(), &mut guard).unwrap();
        assert!(plan.nation_destroyed);
        assert!(plan.relocation.is_none());
    }

    #[test]
    fn test_plan_third_party_owner_keeps_actor_in_place() {
        let map = CityGraph::new();
        let mut city = City::new(CityId(1), "Xu", DEF, 2);
        city.conflict.add(NationId(7), 900);
        city.conflict.add(ATK, 100);
        let cities = vec![city.clone(), City::new(CityId(2), "Other", DEF, 2)];
        let defender = Nation::new(DEF, "Tao");
        let atk = attacker();
        let input = ConquestInput {
            attacker: &atk,
            city: &city,
            defender: Some(&defender),
            defender_cities: &cities,
        };

        let mut guard = GuardRng::new("third party");
        let plan = plan_conquest(input, &map, &BattleConfig::default(), &mut guard).unwrap();
        assert_eq!(plan.new_owner, NationId(7));
        assert!(!plan.actor_moves);
    }

    #[test]
    fn test_plan_rejects_missing_state() {
        let map = CityGraph::new();
        let city = City::new(CityId(1), "Xu", ATK, 2);
        let atk = attacker();
        let input = ConquestInput {
            attacker: &atk,
            city: &city,
            defender: None,
            defender_cities: &[],
        };
        assert!(matches!(
            plan_conquest(input, &map, &BattleConfig::default(), &mut GuardRng::new("reject")),
            Err(ValidationError::MissingConquestState(_))
        ));

        let loner = General::new(GeneralId(2), "Ronin", NationId::NEUTRAL, CityId(1));
        let neutral_city = City::new(CityId(3), "Wild", NationId::NEUTRAL, 1);
        let input = ConquestInput {
            attacker: &loner,
            city: &neutral_city,
            defender: None,
            defender_cities: &[],
        };
        let mut guard = GuardRng::new("reject");
        assert!(plan_conquest(input, &map, &BattleConfig::default(), &mut guard).is_err());
    }
}
