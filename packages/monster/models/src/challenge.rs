//! Challenge rating values.
//!
//! Challenge ratings live on a fixed ladder: `0, 1/8, 1/4, 1/2`, then every
//! whole number from 1 to 30. [`ChallengeRating`] stores a ladder value in
//! eighths so that equality and ordering are exact. Arbitrary (off-ladder)
//! values produced during estimation are plain `f64`s and are snapped back
//! onto the ladder with [`ChallengeRating::nearest`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Highest challenge rating on the ladder.
pub const MAX_CHALLENGE: u16 = 30;

/// Every ladder value, in eighths, in ascending order.
const LADDER_EIGHTHS: [u16; 34] = [
    0, 1, 2, 4, 8, 16, 24, 32, 40, 48, 56, 64, 72, 80, 88, 96, 104, 112, 120, 128, 136, 144, 152,
    160, 168, 176, 184, 192, 200, 208, 216, 224, 232, 240,
];

/// Errors produced while parsing a challenge-rating token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChallengeParseError {
    /// The token is empty.
    #[error("empty challenge rating")]
    Empty,

    /// The token is not an integer or a `numerator/denominator` fraction.
    #[error("malformed challenge rating '{0}'")]
    Malformed(String),

    /// The fraction has a zero denominator.
    #[error("challenge rating '{0}' has a zero denominator")]
    ZeroDenominator(String),

    /// The value parsed, but it is not one of the ladder values.
    #[error("'{0}' is not a valid challenge rating")]
    NotOnLadder(String),
}

/// Parses a challenge-rating token (`"3"`, `"1/2"`, `"1/8"`) into its
/// numeric value.
///
/// No rounding is applied: `"3/4"` yields `0.75` even though it is not a
/// ladder value.
///
/// # Errors
///
/// Returns [`ChallengeParseError`] if the token is empty, negative, not a
/// number or fraction, or has a zero denominator.
pub fn parse_challenge_value(token: &str) -> Result<f64, ChallengeParseError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ChallengeParseError::Empty);
    }

    let malformed = || ChallengeParseError::Malformed(token.to_owned());

    if let Some((numerator, denominator)) = token.split_once('/') {
        let numerator: u32 = numerator.trim().parse().map_err(|_| malformed())?;
        let denominator: u32 = denominator.trim().parse().map_err(|_| malformed())?;
        if denominator == 0 {
            return Err(ChallengeParseError::ZeroDenominator(token.to_owned()));
        }
        return Ok(f64::from(numerator) / f64::from(denominator));
    }

    token
        .parse::<u32>()
        .map(f64::from)
        .map_err(|_| malformed())
}

/// A challenge rating on the canonical ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChallengeRating {
    eighths: u16,
}

impl ChallengeRating {
    /// Challenge rating 0.
    pub const ZERO: Self = Self { eighths: 0 };

    /// Challenge rating 30.
    pub const MAX: Self = Self {
        eighths: MAX_CHALLENGE * 8,
    };

    /// Returns every ladder value in ascending order.
    pub fn ladder() -> impl Iterator<Item = Self> {
        LADDER_EIGHTHS.iter().map(|&eighths| Self { eighths })
    }

    /// Returns the ladder value equal to `value`, if there is one.
    #[must_use]
    pub fn from_value(value: f64) -> Option<Self> {
        Self::ladder().find(|cr| (cr.value() - value).abs() < f64::EPSILON)
    }

    /// Snaps an arbitrary value to the closest ladder value.
    ///
    /// Values below 0 snap to 0 and values above 30 snap to 30. When `value`
    /// lies exactly halfway between two ladder values the lower one wins.
    #[must_use]
    pub fn nearest(value: f64) -> Self {
        let mut best = Self::ZERO;
        let mut best_distance = f64::INFINITY;

        for cr in Self::ladder() {
            let distance = (cr.value() - value).abs();
            if distance < best_distance {
                best = cr;
                best_distance = distance;
            }
        }

        best
    }

    /// Returns the numeric value of this rating.
    #[must_use]
    pub fn value(self) -> f64 {
        f64::from(self.eighths) / 8.0
    }

    /// Returns `true` for the fractional tiers below 1.
    #[must_use]
    pub const fn is_fractional(self) -> bool {
        self.eighths > 0 && self.eighths < 8
    }
}

impl fmt::Display for ChallengeRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.eighths {
            1 => f.write_str("1/8"),
            2 => f.write_str("1/4"),
            4 => f.write_str("1/2"),
            eighths => write!(f, "{}", eighths / 8),
        }
    }
}

impl FromStr for ChallengeRating {
    type Err = ChallengeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = parse_challenge_value(s)?;
        Self::from_value(value).ok_or_else(|| ChallengeParseError::NotOnLadder(s.trim().to_owned()))
    }
}

impl TryFrom<String> for ChallengeRating {
    type Error = ChallengeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChallengeRating> for String {
    fn from(value: ChallengeRating) -> Self {
        value.to_string()
    }
}
