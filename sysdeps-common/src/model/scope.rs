// sysdeps-common/src/model/scope.rs
use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::error::SysdepsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Compile,
    Runtime,
    Provided,
    System,
    Test,
    Import,
}

impl Scope {
    /// Lower is wider. `system` behaves like `provided`.
    fn breadth(self) -> u8 {
        match self {
            Scope::Compile => 0,
            Scope::Runtime => 1,
            Scope::Provided | Scope::System => 2,
            Scope::Test => 3,
            Scope::Import => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Compile => "compile",
            Scope::Runtime => "runtime",
            Scope::Provided => "provided",
            Scope::System => "system",
            Scope::Test => "test",
            Scope::Import => "import",
        }
    }

    /// Parses a declared scope. Unknown values fall back to `compile`.
    pub fn from_declared(value: &str) -> Scope {
        value.parse().unwrap_or(Scope::Compile)
    }

    pub fn is_wider_than(self, other: Scope) -> bool {
        self.breadth() < other.breadth()
    }

    pub fn narrower(self, other: Scope) -> Scope {
        if other.breadth() > self.breadth() {
            other
        } else {
            self
        }
    }

    /// Scope of a dependency declared with `declared` by a node that is itself
    /// in the graph with scope `edge`. `None` means it does not propagate.
    pub fn propagate(edge: Scope, declared: Scope) -> Option<Scope> {
        match declared {
            Scope::Provided | Scope::System | Scope::Test | Scope::Import => None,
            Scope::Compile | Scope::Runtime => Some(edge.narrower(declared)),
        }
    }

    pub fn flag(self) -> ScopeFilter {
        match self {
            Scope::Compile => ScopeFilter::COMPILE,
            Scope::Runtime => ScopeFilter::RUNTIME,
            Scope::Provided => ScopeFilter::PROVIDED,
            Scope::System => ScopeFilter::SYSTEM,
            Scope::Test => ScopeFilter::TEST,
            Scope::Import => ScopeFilter::empty(),
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Scope::Compile
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = SysdepsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "compile" => Ok(Scope::Compile),
            "runtime" => Ok(Scope::Runtime),
            "provided" => Ok(Scope::Provided),
            "system" => Ok(Scope::System),
            "test" => Ok(Scope::Test),
            "import" => Ok(Scope::Import),
            other => Err(SysdepsError::Config(format!("unknown scope '{other}'"))),
        }
    }
}

bitflags! {
    /// Scopes admitted into a resolved graph.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct ScopeFilter: u8 {
        const COMPILE  = 0b00001;
        const RUNTIME  = 0b00010;
        const PROVIDED = 0b00100;
        const SYSTEM   = 0b01000;
        const TEST     = 0b10000;
    }
}

impl Default for ScopeFilter {
    fn default() -> Self {
        Self::COMPILE | Self::RUNTIME
    }
}

impl ScopeFilter {
    pub fn admits(self, scope: Scope) -> bool {
        !scope.flag().is_empty() && self.contains(scope.flag())
    }

    /// Parses a comma separated list such as `compile,runtime`.
    pub fn parse_list(list: &str) -> Result<Self, SysdepsError> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .try_fold(ScopeFilter::empty(), |acc, s| {
                Ok(acc | s.parse::<Scope>()?.flag())
            })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Scope::Compile, Scope::Compile, Some(Scope::Compile))]
    #[case(Scope::Compile, Scope::Runtime, Some(Scope::Runtime))]
    #[case(Scope::Runtime, Scope::Compile, Some(Scope::Runtime))]
    #[case(Scope::Provided, Scope::Compile, Some(Scope::Provided))]
    #[case(Scope::Test, Scope::Runtime, Some(Scope::Test))]
    #[case(Scope::Compile, Scope::Provided, None)]
    #[case(Scope::Compile, Scope::Test, None)]
    #[case(Scope::Runtime, Scope::System, None)]
    fn propagation_table(
        #[case] edge: Scope,
        #[case] declared: Scope,
        #[case] expected: Option<Scope>,
    ) {
        assert_eq!(Scope::propagate(edge, declared), expected);
    }

    #[test]
    fn unknown_declared_scope_is_compile() {
        assert_eq!(Scope::from_declared("weird"), Scope::Compile);
        assert_eq!(Scope::from_declared(" Runtime "), Scope::Runtime);
    }

    #[test]
    fn filter_parsing() {
        let filter = ScopeFilter::parse_list("compile, test").unwrap();
        assert!(filter.admits(Scope::Compile));
        assert!(filter.admits(Scope::Test));
        assert!(!filter.admits(Scope::Runtime));
        assert!(!filter.admits(Scope::Import));
        assert!(ScopeFilter::parse_list("compile,bogus").is_err());
    }
}
