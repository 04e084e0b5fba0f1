//! Error kind hierarchy.
//!
//! Kinds are `static` nodes linked to their parent. A kind is identified by
//! its address: two statics with the same name and parent are still distinct
//! kinds. Declare every kind as a `static`, never a `const`.

use std::fmt;

/// A node in the error kind tree.
#[derive(Debug)]
pub struct ErrorKind {
    name: &'static str,
    parent: Option<&'static ErrorKind>,
}

impl ErrorKind {
    /// A kind with no parent. Only [`ANY`] should normally be a root.
    pub const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    /// A kind nested under `parent`.
    pub const fn child(name: &'static str, parent: &'static ErrorKind) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&self) -> Option<&'static ErrorKind> {
        self.parent
    }

    /// True if `self` is `other` or descends from it.
    pub fn is_a(&self, other: &ErrorKind) -> bool {
        let mut current = Some(self);
        while let Some(kind) = current {
            if std::ptr::eq(kind, other) {
                return true;
            }
            current = kind.parent;
        }
        false
    }
}

impl PartialEq for ErrorKind {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for ErrorKind {}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub static ANY: ErrorKind = ErrorKind::root("error");

pub static RUNTIME: ErrorKind = ErrorKind::child("runtime", &ANY);
pub static ILLEGAL_ARGUMENT: ErrorKind = ErrorKind::child("illegal_argument", &RUNTIME);
pub static ILLEGAL_STATE: ErrorKind = ErrorKind::child("illegal_state", &RUNTIME);
pub static UNSUPPORTED_OPERATION: ErrorKind = ErrorKind::child("unsupported_operation", &RUNTIME);
pub static SERIALIZATION: ErrorKind = ErrorKind::child("serialization", &RUNTIME);

pub static IO: ErrorKind = ErrorKind::child("io", &ANY);
pub static TIMEOUT: ErrorKind = ErrorKind::child("timeout", &IO);
pub static TRANSPORT: ErrorKind = ErrorKind::child("transport", &IO);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_their_own_ancestors() {
        assert!(ILLEGAL_ARGUMENT.is_a(&ILLEGAL_ARGUMENT));
        assert!(ANY.is_a(&ANY));
    }

    #[test]
    fn parents_do_not_match_children() {
        assert!(ILLEGAL_ARGUMENT.is_a(&RUNTIME));
        assert!(!RUNTIME.is_a(&ILLEGAL_ARGUMENT));
        assert!(!ILLEGAL_STATE.is_a(&ILLEGAL_ARGUMENT));
    }

    #[test]
    fn every_builtin_kind_reaches_any() {
        for kind in [
            &RUNTIME,
            &ILLEGAL_ARGUMENT,
            &ILLEGAL_STATE,
            &UNSUPPORTED_OPERATION,
            &SERIALIZATION,
            &IO,
            &TIMEOUT,
            &TRANSPORT,
        ] {
            assert!(kind.is_a(&ANY), "{kind} should descend from ANY");
        }
    }

    #[test]
    fn same_name_under_other_parent_is_distinct() {
        static LOOKALIKE: ErrorKind = ErrorKind::child("timeout", &RUNTIME);
        assert_ne!(LOOKALIKE, TIMEOUT);
        assert!(!LOOKALIKE.is_a(&IO));
    }

    #[test]
    fn identical_declarations_are_distinct_kinds() {
        static BILLING_NOT_FOUND: ErrorKind = ErrorKind::child("not_found", &RUNTIME);
        static CATALOG_NOT_FOUND: ErrorKind = ErrorKind::child("not_found", &RUNTIME);
        assert_ne!(BILLING_NOT_FOUND, CATALOG_NOT_FOUND);
        assert!(!BILLING_NOT_FOUND.is_a(&CATALOG_NOT_FOUND));
        assert!(BILLING_NOT_FOUND.is_a(&BILLING_NOT_FOUND));
        assert!(CATALOG_NOT_FOUND.is_a(&RUNTIME));
    }
}
