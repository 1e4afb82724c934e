//! Corniness levels
//!
//! Every joke in the dataset is filed under one of five levels, from subtle
//! wordplay (1) to stacked, shameless puns (5).

use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// Corniness level of a joke
///
/// Serialized as its numeric value (1-5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CornLevel {
    /// Subtle wordplay, almost respectable
    MildChuckle,
    /// Classic dad territory
    DadApproved,
    /// Peak dad joke territory
    EyeRoll,
    /// Painfully punny
    GroanZone,
    /// So bad they're good again
    UltraCorn,
}

impl CornLevel {
    /// Numeric level (1-5)
    pub fn value(&self) -> u8 {
        match self {
            CornLevel::MildChuckle => 1,
            CornLevel::DadApproved => 2,
            CornLevel::EyeRoll => 3,
            CornLevel::GroanZone => 4,
            CornLevel::UltraCorn => 5,
        }
    }

    /// Level from its numeric value, `None` outside 1-5
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(CornLevel::MildChuckle),
            2 => Some(CornLevel::DadApproved),
            3 => Some(CornLevel::EyeRoll),
            4 => Some(CornLevel::GroanZone),
            5 => Some(CornLevel::UltraCorn),
            _ => None,
        }
    }

    /// Parse the dataset key form ("1".."5")
    pub fn from_key(key: &str) -> Option<Self> {
        key.trim().parse::<u8>().ok().and_then(Self::from_value)
    }

    /// Dataset key form ("1".."5")
    pub fn key(&self) -> String {
        self.value().to_string()
    }

    /// Zero-based index, handy for per-level arrays
    pub fn index(&self) -> usize {
        usize::from(self.value() - 1)
    }

    /// Get human-readable display name
    pub fn display_name(&self) -> &'static str {
        match self {
            CornLevel::MildChuckle => "Mild Chuckle",
            CornLevel::DadApproved => "Dad Approved",
            CornLevel::EyeRoll => "Eye Roll Guaranteed",
            CornLevel::GroanZone => "Groan Zone",
            CornLevel::UltraCorn => "Ultra Corn",
        }
    }

    /// One-line description shown next to a delivered joke
    pub fn description(&self) -> &'static str {
        match self {
            CornLevel::MildChuckle => "Subtle wordplay, almost respectable",
            CornLevel::DadApproved => "Classic dad territory",
            CornLevel::EyeRoll => "Peak dad joke territory",
            CornLevel::GroanZone => "Painfully punny",
            CornLevel::UltraCorn => "So bad they're good again",
        }
    }

    /// All levels in ascending order
    pub fn all() -> &'static [CornLevel] {
        &[
            CornLevel::MildChuckle,
            CornLevel::DadApproved,
            CornLevel::EyeRoll,
            CornLevel::GroanZone,
            CornLevel::UltraCorn,
        ]
    }

    /// Saturating step up/down by `delta` levels
    pub fn offset(&self, delta: i32) -> CornLevel {
        let v = (i32::from(self.value()) + delta).clamp(1, 5);
        // clamp keeps v within 1..=5
        CornLevel::from_value(v as u8).unwrap_or(*self)
    }
}

impl Default for CornLevel {
    /// Middle of the scale
    fn default() -> Self {
        CornLevel::EyeRoll
    }
}

impl TryFrom<u8> for CornLevel {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        CornLevel::from_value(value)
            .ok_or_else(|| format!("corniness level must be between 1 and 5, got {}", value))
    }
}

impl From<CornLevel> for u8 {
    fn from(level: CornLevel) -> u8 {
        level.value()
    }
}

impl std::fmt::Display for CornLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}
