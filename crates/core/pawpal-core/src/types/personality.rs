//! Personality and mood tags

use crate::PawpalError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed temperament of a companion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    /// Aloof, terse, secretly caring
    Cold,
    /// Dependent and affectionate
    Clingy,
    /// Energetic and excitable
    Playful,
    /// Gentle and reserved
    Quiet,
}

impl Personality {
    /// Every personality, in declaration order
    pub const ALL: [Personality; 4] = [
        Personality::Cold,
        Personality::Clingy,
        Personality::Playful,
        Personality::Quiet,
    ];

    /// Stable lowercase tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Personality::Cold => "cold",
            Personality::Clingy => "clingy",
            Personality::Playful => "playful",
            Personality::Quiet => "quiet",
        }
    }

    /// Energy lost on a turn with no positive interaction
    pub fn idle_energy_decay(&self) -> i32 {
        match self {
            Personality::Clingy => 5,
            Personality::Cold => 2,
            Personality::Playful | Personality::Quiet => 1,
        }
    }

    /// Mood settled into on a turn with no positive interaction
    pub fn idle_mood(&self) -> Mood {
        match self {
            Personality::Clingy => Mood::Lonely,
            _ => Mood::Neutral,
        }
    }

    /// Chance per tick that an unprompted lonely message is due
    pub fn lonely_probability(&self) -> f64 {
        match self {
            Personality::Clingy => 1.0,
            Personality::Cold => 0.3,
            Personality::Playful | Personality::Quiet => 0.6,
        }
    }
}

impl Default for Personality {
    fn default() -> Self {
        Personality::Quiet
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Personality {
    type Err = PawpalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cold" => Ok(Personality::Cold),
            "clingy" => Ok(Personality::Clingy),
            "playful" => Ok(Personality::Playful),
            "quiet" => Ok(Personality::Quiet),
            other => Err(PawpalError::InvalidPersonality(other.to_string())),
        }
    }
}

/// Derived emotional state, recomputed every turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    /// Two or more recent positive interactions
    Happy,
    /// Exactly one recent positive interaction
    Content,
    /// No positive interaction
    Neutral,
    /// No positive interaction, clingy temperament
    Lonely,
}

impl Mood {
    /// Stable lowercase tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Content => "content",
            Mood::Neutral => "neutral",
            Mood::Lonely => "lonely",
        }
    }
}

impl Default for Mood {
    fn default() -> Self {
        Mood::Neutral
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
