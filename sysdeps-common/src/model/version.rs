// sysdeps-common/src/model/version.rs
//! Maven-style version ordering and version ranges.
//!
//! Versions are not semver: `1.0` equals `1`, `1.0-alpha-1` sorts before
//! `1.0`, and numeric items always sort after qualifiers.
use std::cmp::Ordering;
use std::fmt;

use crate::error::{Result, SysdepsError};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
    Number(String),
    Qualifier(String),
}

#[derive(Debug, Clone)]
pub struct MavenVersion {
    raw: String,
    items: Vec<Item>,
}

impl MavenVersion {
    pub fn parse(raw: &str) -> Self {
        let mut items = Vec::new();
        let mut current = String::new();
        let mut digits = false;

        let flush = |current: &mut String, digits: bool, items: &mut Vec<Item>| {
            if current.is_empty() {
                return;
            }
            let token = std::mem::take(current);
            if digits {
                let trimmed = token.trim_start_matches('0');
                items.push(Item::Number(if trimmed.is_empty() { "0" } else { trimmed }.to_string()));
            } else {
                items.push(Item::Qualifier(token.to_ascii_lowercase()));
            }
        };

        for c in raw.trim().chars() {
            if c == '.' || c == '-' || c == '_' {
                flush(&mut current, digits, &mut items);
                continue;
            }
            let is_digit = c.is_ascii_digit();
            if !current.is_empty() && is_digit != digits {
                flush(&mut current, digits, &mut items);
            }
            digits = is_digit;
            current.push(c);
        }
        flush(&mut current, digits, &mut items);

        while items.last().is_some_and(Item::is_null) {
            items.pop();
        }

        Self {
            raw: raw.trim().to_string(),
            items,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Item {
    fn is_null(&self) -> bool {
        match self {
            Item::Number(n) => n == "0",
            Item::Qualifier(q) => qualifier_rank(q) == RELEASE_RANK,
        }
    }
}

const RELEASE_RANK: u8 = 5;

fn qualifier_rank(q: &str) -> u8 {
    match q {
        "alpha" | "a" => 0,
        "beta" | "b" => 1,
        "milestone" | "m" => 2,
        "rc" | "cr" => 3,
        "snapshot" => 4,
        "" | "ga" | "final" | "release" => RELEASE_RANK,
        "sp" => 6,
        _ => 7,
    }
}

fn compare_qualifiers(a: &str, b: &str) -> Ordering {
    qualifier_rank(a)
        .cmp(&qualifier_rank(b))
        .then_with(|| a.cmp(b))
}

fn compare_numbers(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_items(a: Option<&Item>, b: Option<&Item>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (Some(Item::Number(x)), Some(Item::Number(y))) => compare_numbers(x, y),
        (Some(Item::Number(_)), Some(Item::Qualifier(_))) => Ordering::Greater,
        (Some(Item::Qualifier(_)), Some(Item::Number(_))) => Ordering::Less,
        (Some(Item::Qualifier(x)), Some(Item::Qualifier(y))) => compare_qualifiers(x, y),
        (Some(Item::Number(x)), None) => compare_numbers(x, "0"),
        (None, Some(Item::Number(y))) => compare_numbers("0", y),
        (Some(Item::Qualifier(x)), None) => compare_qualifiers(x, ""),
        (None, Some(Item::Qualifier(y))) => compare_qualifiers("", y),
    }
}

impl Ord for MavenVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.items.len().max(other.items.len());
        (0..len)
            .map(|i| compare_items(self.items.get(i), other.items.get(i)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for MavenVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for MavenVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MavenVersion {}

impl fmt::Display for MavenVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Bound {
    version: MavenVersion,
    inclusive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Restriction {
    lower: Option<Bound>,
    upper: Option<Bound>,
}

impl Restriction {
    fn contains(&self, version: &MavenVersion) -> bool {
        let above = match &self.lower {
            None => true,
            Some(b) if b.inclusive => version >= &b.version,
            Some(b) => version > &b.version,
        };
        let below = match &self.upper {
            None => true,
            Some(b) if b.inclusive => version <= &b.version,
            Some(b) => version < &b.version,
        };
        above && below
    }
}

/// A union of intervals such as `[1.0,2.0)` or `(,1.0],[1.2,)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    raw: String,
    restrictions: Vec<Restriction>,
}

impl VersionRange {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || SysdepsError::InvalidVersionRange(raw.to_string());
        let mut rest = raw.trim();
        let mut restrictions = Vec::new();

        while !rest.is_empty() {
            let open = rest.chars().next().ok_or_else(invalid)?;
            if open != '[' && open != '(' {
                return Err(invalid());
            }
            let close_at = rest.find([']', ')']).ok_or_else(invalid)?;
            let close = &rest[close_at..close_at + 1];
            let body = &rest[1..close_at];
            restrictions.push(Self::parse_restriction(body, open == '[', close == "]").ok_or_else(invalid)?);

            rest = rest[close_at + 1..].trim_start();
            if let Some(after) = rest.strip_prefix(',') {
                rest = after.trim_start();
                if rest.is_empty() {
                    return Err(invalid());
                }
            } else if !rest.is_empty() {
                return Err(invalid());
            }
        }

        if restrictions.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            raw: raw.trim().to_string(),
            restrictions,
        })
    }

    fn parse_restriction(body: &str, lower_inclusive: bool, upper_inclusive: bool) -> Option<Restriction> {
        let bound = |text: &str, inclusive: bool| {
            let text = text.trim();
            (!text.is_empty()).then(|| Bound {
                version: MavenVersion::parse(text),
                inclusive,
            })
        };

        match body.split_once(',') {
            None => {
                // `[1.0]` pins one version exactly.
                if !(lower_inclusive && upper_inclusive) || body.trim().is_empty() {
                    return None;
                }
                let exact = bound(body, true)?;
                Some(Restriction {
                    lower: Some(exact.clone()),
                    upper: Some(exact),
                })
            }
            Some((low, high)) => {
                let lower = bound(low, lower_inclusive);
                let upper = bound(high, upper_inclusive);
                if let (Some(l), Some(u)) = (&lower, &upper) {
                    if l.version > u.version {
                        return None;
                    }
                }
                Some(Restriction { lower, upper })
            }
        }
    }

    pub fn contains(&self, version: &MavenVersion) -> bool {
        self.restrictions.iter().any(|r| r.contains(version))
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// What a dependency declaration asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRequirement {
    /// A plain version, used verbatim.
    Exact(String),
    Range(VersionRange),
}

impl VersionRequirement {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.starts_with('[') || trimmed.starts_with('(') {
            VersionRange::parse(trimmed).map(VersionRequirement::Range)
        } else {
            Ok(VersionRequirement::Exact(trimmed.to_string()))
        }
    }

    /// Picks the highest candidate satisfying the requirement.
    pub fn select<'a, I>(&self, candidates: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        match self {
            VersionRequirement::Exact(v) => candidates.into_iter().find(|c| *c == v.as_str()),
            VersionRequirement::Range(range) => candidates
                .into_iter()
                .map(|c| (MavenVersion::parse(c), c))
                .filter(|(parsed, _)| range.contains(parsed))
                .max_by(|a, b| a.0.cmp(&b.0))
                .map(|(_, c)| c),
        }
    }
}

/// Highest version by Maven ordering.
pub fn highest<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    versions
        .into_iter()
        .map(|v| (MavenVersion::parse(v), v))
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("1.0", "1", Ordering::Equal)]
    #[case("1.0.0", "1.ga", Ordering::Equal)]
    #[case("1.10", "1.9", Ordering::Greater)]
    #[case("1.0-alpha-1", "1.0", Ordering::Less)]
    #[case("1.0-beta", "1.0-alpha", Ordering::Greater)]
    #[case("1.0-rc1", "1.0-SNAPSHOT", Ordering::Less)]
    #[case("1.0-SNAPSHOT", "1.0", Ordering::Less)]
    #[case("1.0-sp1", "1.0", Ordering::Greater)]
    #[case("2.0.1", "2.0.1.1", Ordering::Less)]
    #[case("1.0.1", "1.0-foo", Ordering::Greater)]
    #[case("007", "7", Ordering::Equal)]
    fn maven_ordering(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
        assert_eq!(MavenVersion::parse(a).cmp(&MavenVersion::parse(b)), expected);
    }

    #[rstest]
    #[case("[1.0,2.0)", "1.0", true)]
    #[case("[1.0,2.0)", "2.0", false)]
    #[case("(1.0,2.0]", "1.0", false)]
    #[case("(1.0,2.0]", "2.0", true)]
    #[case("[1.5]", "1.5", true)]
    #[case("[1.5]", "1.6", false)]
    #[case("(,1.0]", "0.9", true)]
    #[case("[3.0,)", "10.1", true)]
    #[case("(,1.0],[1.2,)", "1.1", false)]
    #[case("(,1.0],[1.2,)", "1.3", true)]
    fn range_membership(#[case] range: &str, #[case] version: &str, #[case] expected: bool) {
        let range = VersionRange::parse(range).unwrap();
        assert_eq!(range.contains(&MavenVersion::parse(version)), expected);
    }

    #[rstest]
    #[case("[2.0,1.0]")]
    #[case("[1.0")]
    #[case("[1.0),")]
    #[case("(1.0)")]
    #[case("1.0]")]
    fn invalid_ranges(#[case] range: &str) {
        assert!(VersionRange::parse(range).is_err());
    }

    #[test]
    fn range_selects_highest_match() {
        let req = VersionRequirement::parse("[1.0,2.0)").unwrap();
        let available = ["0.9", "1.0", "1.5", "1.10", "2.0"];
        assert_eq!(req.select(available), Some("1.10"));

        let none = VersionRequirement::parse("[3.0,)").unwrap();
        assert_eq!(none.select(available), None);
    }

    #[test]
    fn highest_uses_maven_order() {
        assert_eq!(highest(["1.9", "1.10", "1.10-SNAPSHOT"]), Some("1.10"));
        assert_eq!(highest(Vec::<&str>::new()), None);
    }
}
