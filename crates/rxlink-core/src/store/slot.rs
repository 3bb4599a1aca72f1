// ── Slot value types ──

use serde::Serialize;

use crate::error::ErrorInfo;

/// Cached state of one resource kind.
///
/// `value` is overwritten by every completed fetch, with the default
/// (empty) value when the fetch failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSlot<T> {
    pub value: T,
    pub loading: bool,
    pub error: Option<ErrorInfo>,
}

/// A slot that has never been fetched: empty and loading.
impl<T: Default> Default for ResourceSlot<T> {
    fn default() -> Self {
        Self {
            value: T::default(),
            loading: true,
            error: None,
        }
    }
}

impl<T> ResourceSlot<T> {
    /// A completed fetch: not loading.
    pub fn is_settled(&self) -> bool {
        !self.loading
    }
}

/// State of one mutation kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationSlot<T> {
    pub result: Option<T>,
    pub loading: bool,
    pub error: Option<ErrorInfo>,
}

impl<T> Default for MutationSlot<T> {
    fn default() -> Self {
        Self {
            result: None,
            loading: false,
            error: None,
        }
    }
}
