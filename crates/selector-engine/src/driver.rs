//! Browsing-context abstraction the engine resolves against
//!
//! The engine needs only a minimal capability set from the automation driver:
//! find elements by a textual selector expression, wait for a state within a
//! timeout, report closed-ness, and perform the standard element actions. Any
//! driver exposing these can be substituted.

use crate::chain::WaitState;
use async_trait::async_trait;
use std::time::Duration;
use steadyweb_core_types::AutomationError;

/// Opaque handle to a live element inside a [`PageContext`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    /// Driver-assigned element identifier
    pub element_id: String,

    /// Selector expression that matched this element
    pub selector: String,
}

impl ElementHandle {
    /// Create a new handle
    pub fn new(element_id: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            selector: selector.into(),
        }
    }
}

/// Minimal driver capability set required by the selector engine
///
/// Selector expressions are plain strings interpreted by the driver. The
/// engine composes text-matching expressions with [`text_selector`] and
/// [`scoped_text_selector`]; drivers are expected to understand the
/// `text=...` form and the `a >> b` scoping form.
#[async_trait]
pub trait PageContext: Send + Sync {
    /// Whether the underlying page/frame is closed or detached
    fn is_closed(&self) -> bool;

    /// Wait for one element matching `selector` to reach `state`
    async fn wait_for_selector(
        &self,
        selector: &str,
        state: WaitState,
        timeout: Duration,
    ) -> Result<ElementHandle, AutomationError>;

    /// All currently attached elements matching `selector`
    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>, AutomationError>;

    /// Click an element
    async fn click(&self, handle: &ElementHandle, force: bool) -> Result<(), AutomationError>;

    /// Fill a form control with `value`
    async fn fill(
        &self,
        handle: &ElementHandle,
        value: &str,
        clear_first: bool,
    ) -> Result<(), AutomationError>;
}

/// Build an ad-hoc text-matching selector expression
pub fn text_selector(text: &str) -> String {
    format!("text={}", text)
}

/// Scope a text match under a container selector
pub fn scoped_text_selector(container: &str, text: &str) -> String {
    format!("{} >> text={}", container, text)
}
