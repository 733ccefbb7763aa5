//! Run configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::path::{in_root, strip_vendor};

/// Configuration for one transformation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Effective import path of the entry package to transform.
    pub entry_path: String,
    /// Effective-path prefix; only packages underneath are transformed.
    pub root_path: String,
    /// On-disk directory corresponding to `root_path`.
    pub root_dir: PathBuf,
    /// Load and transform test files as well.
    #[serde(default)]
    pub include_tests: bool,
}

impl Config {
    /// Whether a package path is in scope for this run. Vendored spellings
    /// of an in-scope path count as in scope.
    pub fn in_scope(&self, path: &str) -> bool {
        in_root(strip_vendor(path), &self.root_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            entry_path: "root/main".to_string(),
            root_path: "root".to_string(),
            root_dir: PathBuf::from("/tmp/x"),
            include_tests: false,
        }
    }

    #[test]
    fn scope_follows_root_prefix() {
        let c = config();
        assert!(c.in_scope("root/a"));
        assert!(!c.in_scope("fmt"));
    }

    #[test]
    fn vendored_spelling_is_in_scope() {
        let c = config();
        assert!(c.in_scope("root/main/vendor/root/x"));
    }
}
