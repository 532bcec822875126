//! Role by complexity hour bounds and estimate validation.

use serde::{Deserialize, Serialize};

use super::Role;

/// Estimate used when the complexity is unknown and the raw value unusable.
pub const UNKNOWN_DEFAULT_HOURS: u32 = 8;

/// Task complexity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
}

impl Complexity {
    /// Parse a complexity label, accepting common synonyms.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "simple" | "low" | "easy" | "small" => Some(Self::Simple),
            "medium" | "moderate" | "mid" => Some(Self::Medium),
            "complex" | "high" | "hard" | "large" => Some(Self::Complex),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Medium => "medium",
            Self::Complex => "complex",
        }
    }
}

/// Hour bounds for one (role, complexity) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourBounds {
    pub min: u32,
    pub max: u32,
    pub default: u32,
}

const fn b(min: u32, max: u32, default: u32) -> HourBounds {
    HourBounds { min, max, default }
}

/// Bounds table: (role, [simple, medium, complex]).
const BOUNDS: &[(Role, [HourBounds; 3])] = &[
    (Role::Frontend, [b(2, 6, 4), b(6, 16, 10), b(12, 32, 20)]),
    (Role::Backend, [b(2, 8, 4), b(8, 20, 12), b(16, 40, 24)]),
    (Role::Fullstack, [b(3, 8, 5), b(8, 24, 14), b(16, 40, 28)]),
    (Role::Tester, [b(1, 4, 2), b(3, 10, 6), b(6, 16, 10)]),
    (Role::Devops, [b(2, 6, 3), b(4, 12, 8), b(8, 24, 16)]),
];

/// Look up the bounds for a role and complexity.
pub fn bounds_for(role: Role, complexity: Complexity) -> HourBounds {
    let tier = match complexity {
        Complexity::Simple => 0,
        Complexity::Medium => 1,
        Complexity::Complex => 2,
    };
    BOUNDS
        .iter()
        .find(|(r, _)| *r == role)
        .map(|(_, tiers)| tiers[tier])
        .unwrap_or(HourBounds {
            min: 1,
            max: 40,
            default: UNKNOWN_DEFAULT_HOURS,
        })
}

fn usable(raw: Option<f64>) -> Option<f64> {
    raw.filter(|h| h.is_finite() && *h > 0.0)
}

/// Validate a raw estimate against the bounds table.
///
/// Missing, zero or non-finite estimates take the bounds default; others are
/// clamped into `[min, max]`. An unknown complexity keeps a positive raw
/// estimate (rounded) or falls back to 8 hours.
pub fn validate_hours(role: Role, complexity: Option<Complexity>, raw: Option<f64>) -> u32 {
    match complexity {
        Some(c) => {
            let bounds = bounds_for(role, c);
            match usable(raw) {
                Some(h) => (h.round() as u32).clamp(bounds.min, bounds.max),
                None => bounds.default,
            }
        }
        None => usable(raw)
            .map(|h| (h.round() as u32).max(1))
            .unwrap_or(UNKNOWN_DEFAULT_HOURS),
    }
}
