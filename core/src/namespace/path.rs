//! Action type parser and namespace resolution.
//!
//! Parses types like `cart/add` into the owning namespace and the handler
//! name inside it. A type without a separator addresses a root handler.
//! Parsing is total: any string yields a target, nothing is validated.

use std::fmt;


/// Separator between namespace and target in an action type.
pub const SEPARATOR: char = '/';


/// A parsed action type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionTarget<'a> {
    /// First segment, present only when a non-empty second segment follows.
    /// May be `Some("")` for types like `/reset`.
    pub namespace: Option<&'a str>,
    /// Handler name looked up in the resolved handler table.
    pub target: &'a str,
}

impl<'a> ActionTarget<'a> {
    /// Split `pattern` on the first separator.
    ///
    /// The second segment ends at the next separator; anything after it is
    /// ignored. An empty second segment (`cart/`) leaves the type
    /// un-namespaced with the first segment as target.
    pub fn parse(pattern: &'a str) -> Self {
        let mut parts = pattern.split(SEPARATOR);
        let first = parts.next().unwrap_or_default();
        match parts.next() {
            Some(second) if !second.is_empty() => ActionTarget {
                namespace: Some(first),
                target: second,
            },
            _ => ActionTarget {
                namespace: None,
                target: first,
            },
        }
    }

    /// The namespace to route to. An empty namespace routes to root handlers.
    pub fn routed_namespace(&self) -> Option<&'a str> {
        self.namespace.filter(|ns| !ns.is_empty())
    }

    /// True if the type routes to a namespace's handler table.
    pub fn is_namespaced(&self) -> bool {
        self.routed_namespace().is_some()
    }
}

impl fmt::Display for ActionTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.namespace {
            Some(ns) => write!(f, "{}{}{}", ns, SEPARATOR, self.target),
            None => f.write_str(self.target),
        }
    }
}


/// Resolve an action type into its namespace and target.
pub fn resolve(pattern: &str) -> ActionTarget<'_> {
    ActionTarget::parse(pattern)
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn namespaced_type() {
        let t = resolve("cart/add");
        assert_eq!(t.namespace, Some("cart"));
        assert_eq!(t.target, "add");
        assert!(t.is_namespaced());
    }

    #[test]
    fn bare_type_is_root() {
        let t = resolve("increment");
        assert_eq!(t.namespace, None);
        assert_eq!(t.target, "increment");
        assert!(!t.is_namespaced());
    }

    #[test]
    fn empty_input() {
        let t = resolve("");
        assert_eq!(t.namespace, None);
        assert_eq!(t.target, "");
    }

    #[test]
    fn trailing_separator_is_root() {
        let t = resolve("cart/");
        assert_eq!(t.namespace, None);
        assert_eq!(t.target, "cart");
    }

    #[test]
    fn leading_separator_keeps_empty_namespace() {
        let t = resolve("/reset");
        assert_eq!(t.namespace, Some(""));
        assert_eq!(t.target, "reset");
        assert_eq!(t.routed_namespace(), None);
        assert!(!t.is_namespaced());
    }

    #[test]
    fn extra_segments_are_ignored() {
        let t = resolve("a/b/c");
        assert_eq!(t.namespace, Some("a"));
        assert_eq!(t.target, "b");
    }

    #[test]
    fn display_round_trips_two_segments() {
        assert_eq!(resolve("cart/add").to_string(), "cart/add");
        assert_eq!(resolve("increment").to_string(), "increment");
    }

    proptest! {
        #[test]
        fn parse_is_total(input in ".*") {
            let t = resolve(&input);
            prop_assert!(input.contains(t.target));
        }

        #[test]
        fn joined_segments_resolve_back(ns in "[a-z]{1,8}", target in "[a-zA-Z_]{1,12}") {
            let joined = format!("{}/{}", ns, target);
            let t = resolve(&joined);
            prop_assert_eq!(t.routed_namespace(), Some(ns.as_str()));
            prop_assert_eq!(t.target, target.as_str());
        }

        #[test]
        fn separator_free_types_are_root(input in "[^/]*") {
            let t = resolve(&input);
            prop_assert_eq!(t.namespace, None);
            prop_assert_eq!(t.target, input.as_str());
        }
    }
}
