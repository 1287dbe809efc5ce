/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// Separator between path segments of a key.
pub const DELIMITER: char = '/';

/// One level of the hierarchy below a list prefix.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ListKey<'a> {
    /// An object directly below the prefix, never contains the delimiter
    Leaf(&'a str),
    /// A common prefix of one or more deeper objects, always ends with the delimiter
    Directory(&'a str),
}

impl<'a> ListKey<'a> {
    /// The key as returned to callers
    pub fn as_str(&self) -> &'a str {
        match self {
            ListKey::Leaf(k) | ListKey::Directory(k) => k,
        }
    }
}

/// Map a flat object name onto the key one level below `prefix`.
///
/// Returns `None` when `name` does not start with `prefix`, or when it is the prefix itself.
pub fn list_key<'a>(prefix: &str, name: &'a str) -> Option<ListKey<'a>> {
    let rest = name.strip_prefix(prefix)?;
    if rest.is_empty() {
        return None;
    }
    match rest.find(DELIMITER) {
        None => Some(ListKey::Leaf(rest)),
        Some(idx) => Some(ListKey::Directory(&rest[..=idx])),
    }
}

#[cfg(test)]
mod tests {
    use super::{list_key, ListKey};

    #[test]
    fn test_leaf_and_directory() {
        assert_eq!(Some(ListKey::Leaf("a")), list_key("", "a"));
        assert_eq!(Some(ListKey::Directory("b/")), list_key("", "b/c"));
        assert_eq!(Some(ListKey::Directory("e/")), list_key("", "e/f/g"));
        assert_eq!(Some(ListKey::Leaf("c")), list_key("b/", "b/c"));
        assert_eq!(Some(ListKey::Directory("f/")), list_key("e/", "e/f/g"));
    }

    #[test]
    fn test_prefix_without_delimiter() {
        // a prefix is a plain string match, not a path segment match
        assert_eq!(Some(ListKey::Leaf("ar")), list_key("fo", "foar"));
        assert_eq!(Some(ListKey::Directory("o/")), list_key("fo", "foo/bar"));
    }

    #[test]
    fn test_names_outside_prefix() {
        assert_eq!(None, list_key("b/", "a"));
        assert_eq!(None, list_key("b/", "b/"));
    }

    #[test]
    fn test_trailing_delimiter_object() {
        // an object literally named "x/" lists as the directory "x/"
        assert_eq!(Some(ListKey::Directory("x/")), list_key("", "x/"));
        assert_eq!("x/", list_key("", "x/").unwrap().as_str());
    }
}
