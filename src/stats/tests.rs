use super::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn test_character_rolls_stay_in_range() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..5_000 {
        let stats = roll_character_stats(&mut rng);
        for value in stats.values() {
            assert!((1..=100).contains(&value), "out of range: {}", value);
        }
    }
}

#[test]
fn test_character_rolls_are_mostly_low() {
    let mut rng = StdRng::seed_from_u64(11);
    let rolls: Vec<i32> = (0..10_000).map(|_| roll_character_stat(&mut rng)).collect();
    let above_fifty = rolls.iter().filter(|v| **v > 50).count();
    // Only the top two tiers can exceed 50, and they cover 10% of rolls
    assert!(above_fifty < 1_000, "too many high rolls: {}", above_fifty);
    assert!(rolls.iter().any(|v| *v > 50));
}

#[test]
fn test_item_stats_match_rarity() {
    let mut rng = StdRng::seed_from_u64(3);
    for rarity in [
        Rarity::Mundane,
        Rarity::Common,
        Rarity::Rare,
        Rarity::Legendary,
        Rarity::Mythical,
    ] {
        for _ in 0..500 {
            let stats = roll_item_stats(rarity, &mut rng);
            for value in stats.values() {
                assert!(rarity.allows(value), "{} rejected {}", rarity, value);
            }
        }
    }
}

#[test]
fn test_mundane_items_are_all_zero() {
    let mut rng = StdRng::seed_from_u64(5);
    assert_eq!(roll_item_stats(Rarity::Mundane, &mut rng), Abilities::default());
}

#[test]
fn test_common_items_roll_both_signs() {
    let mut rng = StdRng::seed_from_u64(9);
    let values: Vec<i32> = (0..200)
        .map(|_| roll_item_stat(Rarity::Common, &mut rng))
        .collect();
    assert!(values.iter().any(|v| *v < 0));
    assert!(values.iter().any(|v| *v > 0));
    assert!(values.iter().all(|v| *v != 0));
}

#[test]
fn test_rarity_distribution_favors_mundane() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut mundane = 0;
    let mut common = 0;
    for _ in 0..10_000 {
        match roll_rarity(&mut rng) {
            Rarity::Mundane => mundane += 1,
            Rarity::Common => common += 1,
            _ => {}
        }
    }
    assert!((4_500..5_500).contains(&mundane), "mundane = {}", mundane);
    assert!((3_500..4_500).contains(&common), "common = {}", common);
}

#[test]
fn test_roll_item_uses_its_rarity() {
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..200 {
        let roll = roll_item(&mut rng);
        assert!(roll.stats.values().iter().all(|v| roll.rarity.allows(*v)));
    }
}

#[test]
fn test_average_and_grade() {
    let stats = Abilities {
        strength: 90,
        dexterity: 80,
        constitution: 70,
        intelligence: 85,
        wisdom: 75,
        charisma: 81,
    };
    // 481 / 6 = 80.17
    assert_eq!(stats.average(), 80);
    assert_eq!(stats.grade(), Grade::A);

    let weak = Abilities::from_fn(|| 19);
    assert_eq!(weak.grade(), Grade::F);
    assert_eq!(Grade::from_average(20).to_string(), "D");
    assert_eq!(Grade::from_average(59), Grade::C);
}

#[test]
fn test_describe_lists_abilities_in_order() {
    let stats = Abilities::from_fn(|| 3);
    let text = stats.describe();
    assert!(text.starts_with("Strength: 3\nDexterity: 3"));
    assert!(text.ends_with("Charisma: 3"));
}

#[test]
fn test_rarity_serializes_by_name() {
    assert_eq!(serde_json::to_string(&Rarity::Legendary).unwrap(), "\"Legendary\"");
    let back: Rarity = serde_json::from_str("\"Mythical\"").unwrap();
    assert_eq!(back, Rarity::Mythical);
}
