/*!
Helpers for working with logical paths.

Logical paths are always rooted at `/` and use `/` as the separator no matter which platform the
process runs on. Every file system canonicalizes incoming paths with [`clean_path`] before using
them as keys so that `/a//b`, `a/b` and `/a/./c/../b` all name the same file.
*/

use std::path::Path;

use crate::config::{PATH_SEPARATOR, ROOT_PATH};

/**
Return the canonical form of a logical path.

Empty segments and `.` segments are dropped and `..` removes the previous segment. A `..` at the
root stays at the root.
*/
pub(crate) fn clean_path(path: &str) -> String {
    let mut segments: Vec<&str> = vec![];
    for segment in path.split(PATH_SEPARATOR) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    let mut cleaned = String::with_capacity(path.len() + 1);
    for segment in segments {
        cleaned.push(PATH_SEPARATOR);
        cleaned.push_str(segment);
    }

    if cleaned.is_empty() {
        return ROOT_PATH.to_string();
    }

    cleaned
}

/**
Returns true if `path` is `root` itself or lies somewhere below it.

Both paths must already be clean.
*/
pub(crate) fn is_under_root(path: &str, root: &str) -> bool {
    if root == ROOT_PATH {
        return true;
    }

    match path.strip_prefix(root) {
        Some(rest) => rest.is_empty() || rest.starts_with(PATH_SEPARATOR),
        None => false,
    }
}

/**
Get `path` relative to `root` without a leading separator.

Both paths must already be clean and `path` must be under `root`.
*/
pub(crate) fn relative_to<'a>(path: &'a str, root: &str) -> &'a str {
    let rest = if root == ROOT_PATH {
        path
    } else {
        path.strip_prefix(root).unwrap_or(path)
    };

    rest.trim_start_matches(PATH_SEPARATOR)
}

/**
Get the directory prefix that children of `path` start with.

For the root this is `/` and for any other directory it is the path followed by a separator.
*/
pub(crate) fn dir_prefix(path: &str) -> String {
    if path == ROOT_PATH {
        return ROOT_PATH.to_string();
    }

    format!("{path}{PATH_SEPARATOR}")
}

/**
Convert a host path relative to some base directory into a clean logical path.

Platform separators are normalized to `/`. Returns `None` if the path contains components that are
not valid UTF-8.
*/
pub(crate) fn logical_from_host(relative: &Path) -> Option<String> {
    let mut logical = String::new();
    for component in relative.components() {
        logical.push(PATH_SEPARATOR);
        logical.push_str(component.as_os_str().to_str()?);
    }

    Some(clean_path(&logical))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn clean_path_canonicalizes_logical_paths() {
        assert_eq!(clean_path(""), "/");
        assert_eq!(clean_path("/"), "/");
        assert_eq!(clean_path("foobar"), "/foobar");
        assert_eq!(clean_path("//a///b/"), "/a/b");
        assert_eq!(clean_path("/a/./c/../b"), "/a/b");
        assert_eq!(clean_path("/../../a"), "/a");
    }

    #[test]
    fn is_under_root_respects_segment_boundaries() {
        assert!(is_under_root("/a/b", "/"));
        assert!(is_under_root("/a/b", "/a"));
        assert!(is_under_root("/a", "/a"));
        assert!(!is_under_root("/ab/c", "/a"));
        assert!(!is_under_root("/b", "/a"));
    }

    #[test]
    fn relative_to_strips_the_root() {
        assert_eq!(relative_to("/a/b/c", "/a"), "b/c");
        assert_eq!(relative_to("/a/b/c", "/"), "a/b/c");
        assert_eq!(relative_to("/a", "/a"), "");
    }

    #[test]
    fn host_paths_are_converted_to_logical_paths() {
        let relative = Path::new("hls").join("live").join("seg-1.ts");
        assert_eq!(
            logical_from_host(&relative),
            Some("/hls/live/seg-1.ts".to_string())
        );
    }
}
