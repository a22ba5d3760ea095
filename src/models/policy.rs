//! Retention policy
//!
//! One signed integer per level, level 1 first. A positive `n` keeps the
//! newest `n` entries of that level; a negative `-d` keeps entries younger
//! than `d` days. Zero is rejected.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::SnapError;

/// How one level decides which entries fall out of it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelRule {
    /// Keep at most this many entries
    KeepCount(usize),
    /// Keep entries younger than this many days
    MaxAgeDays(u32),
}

impl LevelRule {
    pub fn from_signed(value: i64) -> Result<Self, SnapError> {
        match value {
            0 => Err(SnapError::Validation(
                "retention value 0 is not allowed".into(),
            )),
            n if n > 0 => usize::try_from(n)
                .map(LevelRule::KeepCount)
                .map_err(|_| SnapError::Validation(format!("retention count {} too large", n))),
            n => u32::try_from(n.unsigned_abs())
                .map(LevelRule::MaxAgeDays)
                .map_err(|_| SnapError::Validation(format!("retention age {} too large", n))),
        }
    }

    pub fn to_signed(self) -> i64 {
        match self {
            LevelRule::KeepCount(n) => n as i64,
            LevelRule::MaxAgeDays(d) => -i64::from(d),
        }
    }

    /// Age beyond which an entry becomes a candidate, for age rules
    pub fn max_age(self) -> Option<Duration> {
        match self {
            LevelRule::KeepCount(_) => None,
            LevelRule::MaxAgeDays(d) => Some(Duration::days(i64::from(d))),
        }
    }
}

/// Ordered per-level retention rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<i64>", into = "Vec<i64>")]
pub struct RetentionPolicy {
    rules: Vec<LevelRule>,
}

impl RetentionPolicy {
    pub fn new(rules: Vec<LevelRule>) -> Result<Self, SnapError> {
        if rules.is_empty() {
            return Err(SnapError::Validation(
                "retention policy needs at least one level".into(),
            ));
        }
        Ok(Self { rules })
    }

    pub fn from_signed(values: &[i64]) -> Result<Self, SnapError> {
        let rules = values
            .iter()
            .map(|v| LevelRule::from_signed(*v))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(rules)
    }

    pub fn rules(&self) -> &[LevelRule] {
        &self.rules
    }

    /// Rule for a 1-based level
    pub fn rule(&self, level: u32) -> Option<LevelRule> {
        let index = usize::try_from(level).ok()?.checked_sub(1)?;
        self.rules.get(index).copied()
    }

    /// The highest configured level; nothing is promoted out of it
    pub fn highest_level(&self) -> u32 {
        self.rules.len() as u32
    }

    pub fn levels(&self) -> impl Iterator<Item = (u32, LevelRule)> + '_ {
        self.rules
            .iter()
            .enumerate()
            .map(|(i, rule)| (i as u32 + 1, *rule))
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            rules: vec![
                LevelRule::MaxAgeDays(7),
                LevelRule::KeepCount(4),
                LevelRule::KeepCount(3),
            ],
        }
    }
}

impl TryFrom<Vec<i64>> for RetentionPolicy {
    type Error = SnapError;

    fn try_from(values: Vec<i64>) -> Result<Self, Self::Error> {
        Self::from_signed(&values)
    }
}

impl From<RetentionPolicy> for Vec<i64> {
    fn from(policy: RetentionPolicy) -> Self {
        policy.rules.iter().map(|r| r.to_signed()).collect()
    }
}

impl FromStr for RetentionPolicy {
    type Err = SnapError;

    /// Parse a comma separated list such as `-7,4,3`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<i64>().map_err(|_| {
                    SnapError::Validation(format!("invalid retention value '{}'", part))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_signed(&values)
    }
}

impl fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.rules.iter().map(|r| r.to_signed().to_string()).collect();
        f.write_str(&parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_policy() {
        let policy: RetentionPolicy = "-7, 4,3".parse().unwrap();
        assert_eq!(
            policy.rules(),
            &[
                LevelRule::MaxAgeDays(7),
                LevelRule::KeepCount(4),
                LevelRule::KeepCount(3)
            ]
        );
        assert_eq!(policy.highest_level(), 3);
        assert_eq!(policy.to_string(), "-7,4,3");
    }

    #[test]
    fn test_rule_lookup() {
        let policy: RetentionPolicy = "7,4".parse().unwrap();
        assert_eq!(policy.rule(1), Some(LevelRule::KeepCount(7)));
        assert_eq!(policy.rule(2), Some(LevelRule::KeepCount(4)));
        assert_eq!(policy.rule(0), None);
        assert_eq!(policy.rule(3), None);
    }

    #[test]
    fn test_rejects_zero_and_empty() {
        assert!("7,0,3".parse::<RetentionPolicy>().unwrap_err().is_validation());
        assert!("".parse::<RetentionPolicy>().unwrap_err().is_validation());
        assert!("7,x".parse::<RetentionPolicy>().unwrap_err().is_validation());
    }

    #[test]
    fn test_max_age() {
        assert_eq!(LevelRule::MaxAgeDays(7).max_age(), Some(Duration::days(7)));
        assert_eq!(LevelRule::KeepCount(7).max_age(), None);
    }

    #[test]
    fn test_serde_as_integer_list() {
        let policy: RetentionPolicy = serde_json::from_str("[-30, 12]").unwrap();
        assert_eq!(policy.rule(1), Some(LevelRule::MaxAgeDays(30)));
        assert_eq!(serde_json::to_string(&policy).unwrap(), "[-30,12]");
        assert!(serde_json::from_str::<RetentionPolicy>("[]").is_err());
    }
}
