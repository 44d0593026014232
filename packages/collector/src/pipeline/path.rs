//! URL path splitting and segment classification.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static REPEATED_SLASHES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/+").expect("valid slash pattern"));

/// Segments and full path of one request URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParts {
    /// Directory-like segments, colons stripped.
    pub paths: BTreeSet<String>,
    /// Filename-like segments.
    pub files: BTreeSet<String>,
    /// The normalized path, when it is not `/`.
    pub full_path: Option<String>,
}

/// Collapse runs of `/` into one.
pub fn normalize_path(path: &str) -> String {
    REPEATED_SLASHES.replace_all(path, "/").into_owned()
}

/// Whether a segment names a file.
///
/// A segment is a file when it contains a `.`, is not exactly `.`, and its
/// first `.` is not its last character. `user.name` is therefore a file too.
pub fn is_file_segment(segment: &str) -> bool {
    match segment.find('.') {
        Some(dot) => segment != "." && dot != segment.len() - 1,
        None => false,
    }
}

/// Split an already-extracted URL path into its parts.
pub fn split_path(path: &str) -> PathParts {
    let path = normalize_path(path);
    let mut parts = PathParts::default();
    if path == "/" || path.is_empty() {
        return parts;
    }

    for segment in path.split('/').filter(|s| !s.trim().is_empty()) {
        if is_file_segment(segment) {
            parts.files.insert(segment.to_string());
        } else {
            parts.paths.insert(segment.replace(':', ""));
        }
    }
    parts.full_path = Some(path);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mixed_segments() {
        let parts = split_path("/api/v2/user.name/file.txt");

        assert_eq!(parts.full_path.as_deref(), Some("/api/v2/user.name/file.txt"));
        assert_eq!(parts.paths, BTreeSet::from(["api".to_string(), "v2".to_string()]));
        assert_eq!(
            parts.files,
            BTreeSet::from(["file.txt".to_string(), "user.name".to_string()])
        );
    }

    #[test]
    fn test_dot_rules() {
        assert!(is_file_segment("index.html"));
        assert!(is_file_segment(".htaccess"));
        assert!(is_file_segment("a.b."));
        // First dot decides, so ".." counts as a file
        assert!(is_file_segment(".."));
        assert!(!is_file_segment("."));
        assert!(!is_file_segment("trailing."));
        assert!(!is_file_segment("plain"));
    }

    #[test]
    fn test_repeated_slashes_collapse() {
        let parts = split_path("//a///b//");
        assert_eq!(parts.full_path.as_deref(), Some("/a/b/"));
        assert_eq!(parts.paths.len(), 2);
    }

    #[test]
    fn test_root_yields_nothing() {
        assert_eq!(split_path("/"), PathParts::default());
        assert_eq!(split_path("///"), PathParts::default());
    }

    #[test]
    fn test_colons_stripped_from_paths() {
        let parts = split_path("/users/:id/v1:batch");
        assert!(parts.paths.contains("id"));
        assert!(parts.paths.contains("v1batch"));
    }

    proptest! {
        #[test]
        fn every_segment_is_classified_once(segments in proptest::collection::vec("[a-z.]{1,8}", 1..6)) {
            let path = format!("/{}", segments.join("/"));
            let parts = split_path(&path);
            for segment in &segments {
                let as_file = parts.files.contains(segment);
                let as_path = parts.paths.contains(segment);
                prop_assert!(as_file != as_path);
                prop_assert_eq!(as_file, is_file_segment(segment));
            }
        }
    }
}
