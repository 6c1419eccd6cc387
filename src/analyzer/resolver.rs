//! Table-pattern resolution against the live table list

use crate::errors::{JemstatsError, Result};
use crate::schema::pattern_to_regex;

/// Matches table-name patterns against the set of tables in the store.
///
/// Ordinary analyses require exactly one match; the cross-table comparison
/// path consumes every match instead.
pub struct TableResolver {
    available: Vec<String>,
}

impl TableResolver {
    /// Create a resolver over the live table list
    pub fn new(available: Vec<String>) -> Self {
        Self { available }
    }

    /// All tables known to the resolver
    pub fn available(&self) -> &[String] {
        &self.available
    }

    /// All tables matching the pattern, in listing order
    pub fn matching(&self, pattern: &str) -> Result<Vec<String>> {
        let re = pattern_to_regex(pattern)?;
        Ok(self
            .available
            .iter()
            .filter(|t| re.is_match(t))
            .cloned()
            .collect())
    }

    /// Resolve a pattern to exactly one table.
    ///
    /// Zero matches fail with `NoMatch` (carrying the available tables),
    /// more than one with `AmbiguousMatch` (carrying the matched set).
    pub fn resolve(&self, pattern: &str) -> Result<String> {
        let mut matches = self.matching(pattern)?;
        match matches.len() {
            0 => Err(JemstatsError::NoMatch {
                pattern: pattern.to_string(),
                available: self.available.clone(),
            }),
            1 => Ok(matches.remove(0)),
            _ => Err(JemstatsError::AmbiguousMatch {
                pattern: pattern.to_string(),
                matches,
            }),
        }
    }

    /// Resolve a pattern to all matching tables; zero matches fail with
    /// `NoMatch`
    pub fn resolve_all(&self, pattern: &str) -> Result<Vec<String>> {
        let matches = self.matching(pattern)?;
        if matches.is_empty() {
            return Err(JemstatsError::NoMatch {
                pattern: pattern.to_string(),
                available: self.available.clone(),
            });
        }
        Ok(matches)
    }
}
