//! Dice expressions of the form `NdM±K`.
//!
//! Only single-term expressions are supported; `2d6+1d4` is rejected.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

static DICE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s*[dD]\s*(\d+)(?:\s*([+-])\s*(\d+))?$").expect("valid regex")
});

/// Errors produced while parsing a dice expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiceError {
    /// The expression does not have the `NdM±K` shape.
    #[error("malformed dice expression '{0}' (expected NdM+K)")]
    Malformed(String),

    /// The die count or number of sides is zero.
    #[error("dice expression '{0}' has zero dice or zero sides")]
    Degenerate(String),

    /// A component does not fit in the supported integer range.
    #[error("dice expression '{0}' is out of range")]
    Overflow(String),
}

/// A parsed `NdM±K` dice expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiceExpression {
    /// Number of dice rolled.
    pub count: u32,
    /// Sides per die.
    pub sides: u32,
    /// Flat modifier added to the roll.
    pub modifier: i32,
}

impl DiceExpression {
    /// Lowest possible total: every die rolls 1.
    #[must_use]
    pub fn minimum(&self) -> i64 {
        i64::from(self.count) + i64::from(self.modifier)
    }

    /// Highest possible total: every die rolls its maximum.
    #[must_use]
    pub fn maximum(&self) -> i64 {
        i64::from(self.count) * i64::from(self.sides) + i64::from(self.modifier)
    }

    /// The balancing heuristic's "average": the midpoint of [`minimum`] and
    /// [`maximum`], rounded down.
    ///
    /// This is not the statistical expectation (`count * (sides + 1) / 2 +
    /// modifier`); the midpoint is what the balancing table was calibrated
    /// against.
    ///
    /// [`minimum`]: Self::minimum
    /// [`maximum`]: Self::maximum
    #[must_use]
    pub fn heuristic_average(&self) -> i64 {
        (self.minimum() + self.maximum()).div_euclid(2)
    }
}

impl FromStr for DiceExpression {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let caps = DICE_RE
            .captures(trimmed)
            .ok_or_else(|| DiceError::Malformed(trimmed.to_owned()))?;

        let overflow = || DiceError::Overflow(trimmed.to_owned());

        let count: u32 = caps[1].parse().map_err(|_| overflow())?;
        let sides: u32 = caps[2].parse().map_err(|_| overflow())?;
        let magnitude: i32 = match caps.get(4) {
            Some(m) => m.as_str().parse().map_err(|_| overflow())?,
            None => 0,
        };
        let modifier = if caps.get(3).is_some_and(|sign| sign.as_str() == "-") {
            -magnitude
        } else {
            magnitude
        };

        if count == 0 || sides == 0 {
            return Err(DiceError::Degenerate(trimmed.to_owned()));
        }

        // minimum + maximum must fit so the heuristic average cannot overflow
        let minimum = i64::from(count) + i64::from(modifier);
        i64::from(count)
            .checked_mul(i64::from(sides))
            .and_then(|product| product.checked_add(i64::from(modifier)))
            .and_then(|maximum| maximum.checked_add(minimum))
            .ok_or_else(overflow)?;

        Ok(Self {
            count,
            sides,
            modifier,
        })
    }
}

impl fmt::Display for DiceExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifier == 0 {
            write!(f, "{}d{}", self.count, self.sides)
        } else {
            write!(f, "{}d{}{:+}", self.count, self.sides, self.modifier)
        }
    }
}

/// Parses `expression` and returns its heuristic average.
///
/// # Errors
///
/// Returns [`DiceError`] if the expression is not a single `NdM±K` term.
pub fn average_roll(expression: &str) -> Result<i64, DiceError> {
    expression
        .parse::<DiceExpression>()
        .map(|dice| dice.heuristic_average())
}
