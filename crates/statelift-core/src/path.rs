//! Effective import paths.
//!
//! Vendored and non-vendored references to the same package must unify, so
//! every comparison and every emitted qualifier uses the effective path:
//! the import path with everything up to and including the final `vendor/`
//! segment stripped.

/// Strip the vendor prefix from an import path.
///
/// Two cases, depending on whether `vendor/` starts the string. The order
/// matters: the index of the final element is the one that counts, because
/// the final one is where the effective import path starts.
pub fn strip_vendor(path: &str) -> &str {
    let idx = if let Some(i) = path.rfind("/vendor/") {
        Some(i + 1)
    } else if path.starts_with("vendor/") {
        Some(0)
    } else {
        None
    };
    match idx {
        Some(i) => &path[i + "vendor/".len()..],
        None => path,
    }
}

/// Whether `path` (already vendor-stripped) falls under the configured root.
pub fn in_root(path: &str, root: &str) -> bool {
    path.starts_with(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_paths_pass_through() {
        assert_eq!(strip_vendor("root/a"), "root/a");
        assert_eq!(strip_vendor("fmt"), "fmt");
    }

    #[test]
    fn leading_vendor_is_stripped() {
        assert_eq!(strip_vendor("vendor/root/x"), "root/x");
    }

    #[test]
    fn embedded_vendor_is_stripped() {
        assert_eq!(strip_vendor("root/a/vendor/root/x"), "root/x");
    }

    #[test]
    fn last_vendor_segment_wins() {
        assert_eq!(strip_vendor("a/vendor/b/vendor/c"), "c");
    }

    #[test]
    fn vendor_as_package_name_is_untouched() {
        // No trailing slash after "vendor", so it is an ordinary segment.
        assert_eq!(strip_vendor("root/vendor"), "root/vendor");
    }

    #[test]
    fn root_filter() {
        assert!(in_root("root/a", "root"));
        assert!(!in_root("fmt", "root"));
    }
}
