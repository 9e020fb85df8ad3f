//! Access Control List.
//!
//! The external representation is a single JSON object mapping consumer
//! names to arrays of method patterns:
//!
//! ```json
//! {"alice": ["Add", "Check"], "ops": ["*"]}
//! ```
//!
//! A pattern is either a short method name (`Add`) or [`WILDCARD`].

use crate::errors::GatekeeperError;
use serde::Deserialize;
use std::collections::HashMap;

/// Pattern granting every method.
pub const WILDCARD: &str = "*";

/// Consumer -> ordered method patterns. Immutable after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Acl {
    entries: HashMap<String, Vec<String>>,
}

impl Acl {
    /// Build an ACL from already-parsed entries.
    #[must_use]
    pub fn new(entries: HashMap<String, Vec<String>>) -> Self {
        Self { entries }
    }

    /// Parse the JSON representation.
    ///
    /// # Errors
    ///
    /// Returns `GatekeeperError::AclParse` for malformed JSON, a non-object
    /// top level, or non-string patterns.
    pub fn from_json(raw: &str) -> Result<Self, GatekeeperError> {
        serde_json::from_str(raw).map_err(|e| GatekeeperError::AclParse(e.to_string()))
    }

    /// Patterns registered for `consumer`, in declaration order.
    #[must_use]
    pub fn patterns(&self, consumer: &str) -> Option<&[String]> {
        self.entries.get(consumer).map(Vec::as_slice)
    }

    /// Number of consumers in the ACL.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Final path segment of a gRPC method path.
///
/// `/gatekeeper.Biz/Add` -> `Add`. A name without a separator is returned as is.
#[must_use]
pub fn short_method_name(method: &str) -> &str {
    method.rsplit_once('/').map_or(method, |(_, short)| short)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_parses_entries_in_order() {
        let acl = Acl::from_json(r#"{"alice": ["Check", "Add"], "ops": ["*"]}"#).unwrap();

        assert_eq!(acl.len(), 2);
        assert_eq!(
            acl.patterns("alice").unwrap(),
            &["Check".to_string(), "Add".to_string()]
        );
        assert_eq!(acl.patterns("ops").unwrap(), &[WILDCARD.to_string()]);
        assert!(acl.patterns("bob").is_none());
    }

    #[test]
    fn test_from_json_empty_object() {
        let acl = Acl::from_json("{}").unwrap();
        assert!(acl.is_empty());
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        for raw in [
            "",
            "{",
            "not json",
            r#"["alice"]"#,
            r#"{"alice": "Add"}"#,
            r#"{"alice": [1, 2]}"#,
        ] {
            let result = Acl::from_json(raw);
            assert!(
                matches!(result, Err(GatekeeperError::AclParse(_))),
                "expected parse failure for {raw:?}"
            );
        }
    }

    #[test]
    fn test_short_method_name() {
        assert_eq!(short_method_name("/gatekeeper.Biz/Add"), "Add");
        assert_eq!(short_method_name("/gatekeeper.Admin/Logging"), "Logging");
        assert_eq!(short_method_name("Check"), "Check");
        assert_eq!(short_method_name("/gatekeeper.Biz/"), "");
    }
}
