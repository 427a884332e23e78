//! Include / exclude participation test.

use std::collections::HashSet;

use contracts::{FilterConfig, ParamName};

/// Per-edge allow/deny policy over parameter names.
///
/// Precedence is strict: a non-empty include set decides alone (the exclude
/// set is ignored, even for names present in both); otherwise a non-empty
/// exclude set denies its members; otherwise everything syncs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    include: HashSet<ParamName>,
    exclude: HashSet<ParamName>,
}

impl FilterSpec {
    pub fn new<I, E>(include: I, exclude: E) -> Self
    where
        I: IntoIterator<Item = ParamName>,
        E: IntoIterator<Item = ParamName>,
    {
        Self {
            include: include.into_iter().collect(),
            exclude: exclude.into_iter().collect(),
        }
    }

    /// Filter that lets every name through
    pub fn allow_all() -> Self {
        Self::default()
    }

    #[inline]
    pub fn should_sync(&self, name: &str) -> bool {
        if !self.include.is_empty() {
            return self.include.contains(name);
        }
        if !self.exclude.is_empty() {
            return !self.exclude.contains(name);
        }
        true
    }

    /// Exclude entries that will never be consulted because include is set
    pub fn shadowed_excludes(&self) -> impl Iterator<Item = &ParamName> {
        let shadowed = !self.include.is_empty();
        self.exclude.iter().filter(move |_| shadowed)
    }
}

impl From<&FilterConfig> for FilterSpec {
    fn from(config: &FilterConfig) -> Self {
        Self::new(config.include.iter().cloned(), config.exclude.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<ParamName> {
        list.iter().map(|s| ParamName::from(*s)).collect()
    }

    #[test]
    fn test_empty_filter_syncs_everything() {
        let filter = FilterSpec::allow_all();
        assert!(filter.should_sync("health"));
        assert!(filter.should_sync(""));
    }

    #[test]
    fn test_include_wins_over_exclude() {
        let filter = FilterSpec::new(names(&["a"]), names(&["a"]));
        assert!(filter.should_sync("a"));
        assert!(!filter.should_sync("b"));
        assert_eq!(filter.shadowed_excludes().count(), 1);
    }

    #[test]
    fn test_include_only() {
        let filter = FilterSpec::new(names(&["health", "ammo"]), Vec::new());
        assert!(filter.should_sync("health"));
        assert!(filter.should_sync("ammo"));
        assert!(!filter.should_sync("debug"));
    }

    #[test]
    fn test_exclude_only() {
        let filter = FilterSpec::new(Vec::new(), names(&["debug"]));
        assert!(!filter.should_sync("debug"));
        assert!(filter.should_sync("health"));
        assert_eq!(filter.shadowed_excludes().count(), 0);
    }

    #[test]
    fn test_from_config() {
        let config = FilterConfig {
            include: Vec::new(),
            exclude: names(&["debug"]),
        };
        let filter = FilterSpec::from(&config);
        assert!(!filter.should_sync("debug"));
    }
}
