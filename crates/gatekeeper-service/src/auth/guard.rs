//! Authorization guard.
//!
//! A call is allowed iff the consumer is in the ACL and one of its patterns
//! is `*` or equals the method's short name exactly. There is no prefix or
//! partial matching, and a call without an identity is always denied.

use super::acl::{short_method_name, Acl, WILDCARD};
use crate::errors::AccessDenial;
use std::sync::Arc;

/// Allow/deny decisions against a shared, read-only ACL.
#[derive(Debug, Clone)]
pub struct AccessGuard {
    acl: Arc<Acl>,
}

impl AccessGuard {
    #[must_use]
    pub fn new(acl: Arc<Acl>) -> Self {
        Self { acl }
    }

    /// Whether `consumer` may call `method` (full path or short name).
    #[must_use]
    pub fn is_allowed(&self, consumer: &str, method: &str) -> bool {
        self.check(Some(consumer), method).is_ok()
    }

    /// Decide a call, reporting why it was refused.
    ///
    /// # Errors
    ///
    /// Returns the [`AccessDenial`] reason when the call must be rejected.
    pub fn check(&self, consumer: Option<&str>, method: &str) -> Result<(), AccessDenial> {
        let consumer = consumer.ok_or(AccessDenial::MissingIdentity)?;
        let patterns = self
            .acl
            .patterns(consumer)
            .ok_or(AccessDenial::UnknownConsumer)?;

        let short = short_method_name(method);
        if patterns
            .iter()
            .any(|pattern| pattern == WILDCARD || pattern == short)
        {
            Ok(())
        } else {
            Err(AccessDenial::MethodNotPermitted)
        }
    }
}
