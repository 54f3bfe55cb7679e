use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const KILL_KEY: &str = "kill";

/// Key of one scoring table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScoringKey {
    /// Exact placement, e.g. `"1"`
    Exact(u32),
    /// Inclusive placement range, e.g. `"7-8"`
    Range(u32, u32),
    /// Points per kill
    KillRate,
}

impl ScoringKey {
    pub fn parse(s: &str) -> std::result::Result<Self, String> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(KILL_KEY) {
            return Ok(ScoringKey::KillRate);
        }

        if let Some((low, high)) = s.split_once('-') {
            let low = parse_placement(low)?;
            let high = parse_placement(high)?;
            if low > high {
                return Err(format!("range start {} is after range end {}", low, high));
            }
            return Ok(ScoringKey::Range(low, high));
        }

        Ok(ScoringKey::Exact(parse_placement(s)?))
    }

    pub fn matches(&self, placement: u32) -> bool {
        match *self {
            ScoringKey::Exact(p) => p == placement,
            ScoringKey::Range(low, high) => (low..=high).contains(&placement),
            ScoringKey::KillRate => false,
        }
    }
}

fn parse_placement(s: &str) -> std::result::Result<u32, String> {
    let s = s.trim();
    let value: u32 = s
        .parse()
        .map_err(|_| format!("'{}' is not a placement number", s))?;
    if value == 0 {
        return Err("placement 0 means unplaced and cannot be scored".to_string());
    }
    Ok(value)
}

impl fmt::Display for ScoringKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoringKey::Exact(p) => write!(f, "{}", p),
            ScoringKey::Range(low, high) => write!(f, "{}-{}", low, high),
            ScoringKey::KillRate => f.write_str(KILL_KEY),
        }
    }
}

/// Validated scoring table.
///
/// Serialized as the organiser-facing JSON object, e.g.
/// `{"1": 10, "2": 6, "7-8": 1, "kill": 1}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, i64>", into = "BTreeMap<String, i64>")]
pub struct ScoringTable {
    exact: BTreeMap<u32, i64>,
    /// Non-overlapping ranges sorted by lower bound
    ranges: Vec<(u32, u32, i64)>,
    kill_rate: Option<i64>,
}

impl ScoringTable {
    /// Build from typed rules, reporting every problem at once.
    pub fn from_rules<I>(rules: I) -> Result<Self>
    where
        I: IntoIterator<Item = (ScoringKey, i64)>,
    {
        let mut errors = Vec::new();
        let mut exact = BTreeMap::new();
        let mut ranges = Vec::new();
        let mut kill_rate = None;

        for (key, points) in rules {
            match key {
                ScoringKey::Exact(p) => {
                    if exact.insert(p, points).is_some() {
                        errors.push(format!("placement {} is defined more than once", p));
                    }
                }
                ScoringKey::Range(low, high) => ranges.push((low, high, points)),
                ScoringKey::KillRate => {
                    if kill_rate.replace(points).is_some() {
                        errors.push("kill rate is defined more than once".to_string());
                    }
                }
            }
        }

        ranges.sort_by_key(|&(low, high, _)| (low, high));
        for pair in ranges.windows(2) {
            let (a_low, a_high, _) = pair[0];
            let (b_low, b_high, _) = pair[1];
            if b_low <= a_high {
                errors.push(format!(
                    "range {}-{} overlaps range {}-{}",
                    a_low, a_high, b_low, b_high
                ));
            }
        }

        if errors.is_empty() {
            Ok(Self {
                exact,
                ranges,
                kill_rate,
            })
        } else {
            Err(Error::Configuration(errors))
        }
    }

    /// Points awarded for finishing at `placement`.
    ///
    /// An exact key wins over a range containing it; unmatched placements and
    /// the unplaced sentinel score 0.
    pub fn points_for(&self, placement: u32) -> i64 {
        if let Some(points) = self.exact.get(&placement) {
            return *points;
        }
        self.ranges
            .iter()
            .find(|&&(low, high, _)| (low..=high).contains(&placement))
            .map(|&(_, _, points)| points)
            .unwrap_or(0)
    }

    /// Points per kill (0 when the table has no `kill` key)
    pub fn kill_rate(&self) -> i64 {
        self.kill_rate.unwrap_or(0)
    }

    /// Rules in display order: placements by lower bound, then the kill rate
    pub fn rules(&self) -> Vec<(ScoringKey, i64)> {
        let mut rules: Vec<(ScoringKey, i64)> = self
            .exact
            .iter()
            .map(|(&p, &points)| (ScoringKey::Exact(p), points))
            .chain(
                self.ranges
                    .iter()
                    .map(|&(low, high, points)| (ScoringKey::Range(low, high), points)),
            )
            .collect();
        rules.sort_by_key(|(key, _)| match *key {
            ScoringKey::Exact(p) => (p, p),
            ScoringKey::Range(low, high) => (low, high),
            ScoringKey::KillRate => (u32::MAX, u32::MAX),
        });
        if let Some(rate) = self.kill_rate {
            rules.push((ScoringKey::KillRate, rate));
        }
        rules
    }
}

impl Default for ScoringTable {
    /// 1st=12, 2nd=9, 3rd=7, 4th=5, 5th=4, 6-7=3, 8-10=2, 11-12=1, kill=1
    fn default() -> Self {
        Self {
            exact: [(1, 12), (2, 9), (3, 7), (4, 5), (5, 4)].into_iter().collect(),
            ranges: vec![(6, 7, 3), (8, 10, 2), (11, 12, 1)],
            kill_rate: Some(1),
        }
    }
}

impl TryFrom<BTreeMap<String, i64>> for ScoringTable {
    type Error = Error;

    fn try_from(raw: BTreeMap<String, i64>) -> Result<Self> {
        let mut errors = Vec::new();
        let mut rules = Vec::with_capacity(raw.len());
        for (key, points) in &raw {
            match ScoringKey::parse(key) {
                Ok(parsed) => rules.push((parsed, *points)),
                Err(e) => errors.push(format!("key '{}': {}", key, e)),
            }
        }

        match Self::from_rules(rules) {
            Ok(table) if errors.is_empty() => Ok(table),
            Ok(_) => Err(Error::Configuration(errors)),
            Err(Error::Configuration(more)) => {
                errors.extend(more);
                Err(Error::Configuration(errors))
            }
            Err(other) => Err(other),
        }
    }
}

impl From<ScoringTable> for BTreeMap<String, i64> {
    fn from(table: ScoringTable) -> Self {
        table
            .rules()
            .into_iter()
            .map(|(key, points)| (key.to_string(), points))
            .collect()
    }
}
