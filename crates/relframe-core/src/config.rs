//! Filter engine configuration

use serde::{Deserialize, Serialize};

/// Default upper bound on expression text, in bytes (1 MiB)
pub const DEFAULT_MAX_EXPRESSION_LEN: usize = 1024 * 1024;

/// How unqualified column names that exist on the home table are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnqualifiedPolicy {
    /// A column on the home table always wins over related tables
    #[default]
    PreferHome,
    /// A column present on the home table and on any reachable table is ambiguous
    Strict,
}

/// Configuration for `rfilter` calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Longest accepted expression, in bytes
    pub max_expression_len: usize,
    /// Largest join frame the evaluator may build, unbounded when `None`
    pub max_frame_rows: Option<usize>,
    /// Resolution rule for unqualified names
    pub unqualified: UnqualifiedPolicy,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_expression_len: DEFAULT_MAX_EXPRESSION_LEN,
            max_frame_rows: None,
            unqualified: UnqualifiedPolicy::PreferHome,
        }
    }
}

impl FilterConfig {
    /// Set the longest accepted expression
    pub fn with_max_expression_len(mut self, len: usize) -> Self {
        self.max_expression_len = len;
        self
    }

    /// Cap the number of rows a join frame may grow to
    pub fn with_max_frame_rows(mut self, rows: usize) -> Self {
        self.max_frame_rows = Some(rows);
        self
    }

    /// Set the unqualified-name policy
    pub fn with_unqualified(mut self, policy: UnqualifiedPolicy) -> Self {
        self.unqualified = policy;
        self
    }
}
