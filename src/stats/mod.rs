//! Stat rollers for characters and items.
//!
//! Pure functions over a caller-supplied random source. The rolled values are
//! later handed to the analysis step as upper bounds (characters) or exact
//! values (items).

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(test)]
mod tests;

/// The six ability scores
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abilities {
    #[serde(default)]
    pub strength: i32,
    #[serde(default)]
    pub dexterity: i32,
    #[serde(default)]
    pub constitution: i32,
    #[serde(default)]
    pub intelligence: i32,
    #[serde(default)]
    pub wisdom: i32,
    #[serde(default)]
    pub charisma: i32,
}

/// Ability names in display order
pub const ABILITY_NAMES: [&str; 6] = [
    "strength",
    "dexterity",
    "constitution",
    "intelligence",
    "wisdom",
    "charisma",
];

impl Abilities {
    /// Build by calling `roll` once per ability, in display order
    pub fn from_fn(mut roll: impl FnMut() -> i32) -> Self {
        Self {
            strength: roll(),
            dexterity: roll(),
            constitution: roll(),
            intelligence: roll(),
            wisdom: roll(),
            charisma: roll(),
        }
    }

    pub fn values(&self) -> [i32; 6] {
        [
            self.strength,
            self.dexterity,
            self.constitution,
            self.intelligence,
            self.wisdom,
            self.charisma,
        ]
    }

    /// Combine two score sets field by field
    pub fn zip_with(&self, other: &Abilities, f: impl Fn(i32, i32) -> i32) -> Abilities {
        Abilities {
            strength: f(self.strength, other.strength),
            dexterity: f(self.dexterity, other.dexterity),
            constitution: f(self.constitution, other.constitution),
            intelligence: f(self.intelligence, other.intelligence),
            wisdom: f(self.wisdom, other.wisdom),
            charisma: f(self.charisma, other.charisma),
        }
    }

    /// Mean of the six scores, rounded half up
    pub fn average(&self) -> i32 {
        let sum: i32 = self.values().iter().sum();
        crate::shape::round_half_up(sum as f64 / 6.0)
    }

    pub fn grade(&self) -> Grade {
        Grade::from_average(self.average())
    }

    /// "Strength: 12\nDexterity: 40\n..." for prompts and listings
    pub fn describe(&self) -> String {
        ABILITY_NAMES
            .iter()
            .zip(self.values())
            .map(|(name, value)| format!("{}{}: {}", name[..1].to_uppercase(), &name[1..], value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Letter grade for an ability average
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_average(average: i32) -> Self {
        match average {
            a if a >= 80 => Grade::A,
            a if a >= 60 => Grade::B,
            a if a >= 40 => Grade::C,
            a if a >= 20 => Grade::D,
            _ => Grade::F,
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        write!(f, "{}", letter)
    }
}

/// Item rarity tier, constraining stat ranges
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    #[default]
    Mundane,
    Common,
    Rare,
    Legendary,
    Mythical,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Mundane => "Mundane",
            Rarity::Common => "Common",
            Rarity::Rare => "Rare",
            Rarity::Legendary => "Legendary",
            Rarity::Mythical => "Mythical",
        }
    }

    /// Whether a stat value is legal for this rarity
    pub fn allows(&self, value: i32) -> bool {
        match self {
            Rarity::Mundane => value == 0,
            Rarity::Common => (1..=4).contains(&value.abs()),
            Rarity::Rare => (4..=10).contains(&value),
            Rarity::Legendary => (10..=20).contains(&value),
            Rarity::Mythical => (20..=60).contains(&value),
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One character ability roll
///
/// 1% land in 70..=100, 9% in 40..=80, the rest in 1..=50.
pub fn roll_character_stat<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    let roll = rng.gen::<f64>() * 1000.0;
    if roll <= 10.0 {
        rng.gen_range(70..=100)
    } else if roll <= 100.0 {
        rng.gen_range(40..=80)
    } else {
        rng.gen_range(1..=50)
    }
}

/// Six independent character rolls
pub fn roll_character_stats<R: Rng + ?Sized>(rng: &mut R) -> Abilities {
    Abilities::from_fn(|| roll_character_stat(&mut *rng))
}

/// Sample a rarity tier: 0.1% Mythical, 0.9% Legendary, 9% Rare, 40% Common
pub fn roll_rarity<R: Rng + ?Sized>(rng: &mut R) -> Rarity {
    let roll = rng.gen::<f64>() * 1000.0;
    if roll <= 1.0 {
        Rarity::Mythical
    } else if roll <= 10.0 {
        Rarity::Legendary
    } else if roll <= 100.0 {
        Rarity::Rare
    } else if roll <= 500.0 {
        Rarity::Common
    } else {
        Rarity::Mundane
    }
}

/// One item stat modifier within the rarity's range
pub fn roll_item_stat<R: Rng + ?Sized>(rarity: Rarity, rng: &mut R) -> i32 {
    match rarity {
        Rarity::Mundane => 0,
        Rarity::Common => {
            let magnitude = rng.gen_range(1..=4);
            if rng.gen_bool(0.5) {
                magnitude
            } else {
                -magnitude
            }
        }
        Rarity::Rare => rng.gen_range(4..=10),
        Rarity::Legendary => rng.gen_range(10..=20),
        Rarity::Mythical => rng.gen_range(20..=60),
    }
}

/// Rolled rarity plus its six modifiers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRoll {
    pub rarity: Rarity,
    pub stats: Abilities,
}

pub fn roll_item<R: Rng + ?Sized>(rng: &mut R) -> ItemRoll {
    let rarity = roll_rarity(rng);
    ItemRoll {
        rarity,
        stats: roll_item_stats(rarity, rng),
    }
}

pub fn roll_item_stats<R: Rng + ?Sized>(rarity: Rarity, rng: &mut R) -> Abilities {
    Abilities::from_fn(|| roll_item_stat(rarity, &mut *rng))
}
