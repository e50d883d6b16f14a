//! Scriptable stub browsing context for tests
//!
//! Wire the engine to a real driver in production builds; the stub only
//! exists so resolution logic can be exercised without a browser.

use crate::chain::WaitState;
use crate::driver::{ElementHandle, PageContext};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use steadyweb_core_types::AutomationError;

/// Stub page context with scriptable matches and failure injection
#[derive(Default)]
pub struct StubPageContext {
    closed: bool,
    matches: HashSet<String>,
    match_counts: HashMap<String, usize>,
    fail_actions: bool,
    waited: Mutex<Vec<String>>,
    clicked: Mutex<Vec<String>>,
    filled: Mutex<Vec<(String, String)>>,
}

impl StubPageContext {
    /// Create an open context with no matching selectors
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context that reports itself closed
    pub fn closed() -> Self {
        Self {
            closed: true,
            ..Self::default()
        }
    }

    /// Script a selector to resolve to a single element
    pub fn with_match(mut self, selector: impl Into<String>) -> Self {
        self.matches.insert(selector.into());
        self
    }

    /// Script several selectors to resolve
    pub fn with_matches<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.matches.extend(selectors.into_iter().map(Into::into));
        self
    }

    /// Script a selector to resolve to `count` attached elements
    pub fn with_match_count(mut self, selector: impl Into<String>, count: usize) -> Self {
        let selector = selector.into();
        self.matches.insert(selector.clone());
        self.match_counts.insert(selector, count);
        self
    }

    /// Make click/fill calls fail with a network error
    pub fn failing_actions(mut self) -> Self {
        self.fail_actions = true;
        self
    }

    /// Selectors waited for, in call order
    pub fn waited_selectors(&self) -> Vec<String> {
        self.waited.lock().clone()
    }

    /// Element ids clicked, in call order
    pub fn clicked_elements(&self) -> Vec<String> {
        self.clicked.lock().clone()
    }

    /// (element id, value) pairs filled, in call order
    pub fn filled_values(&self) -> Vec<(String, String)> {
        self.filled.lock().clone()
    }

    fn handle_for(selector: &str) -> ElementHandle {
        ElementHandle::new(format!("stub:{}", selector), selector)
    }
}

#[async_trait]
impl PageContext for StubPageContext {
    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        _state: WaitState,
        timeout: Duration,
    ) -> Result<ElementHandle, AutomationError> {
        self.waited.lock().push(selector.to_string());
        if self.matches.contains(selector) {
            Ok(Self::handle_for(selector))
        } else {
            Err(AutomationError::ActionTimeout(format!(
                "no element for '{}' within {}ms",
                selector,
                timeout.as_millis()
            )))
        }
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>, AutomationError> {
        let count = self
            .match_counts
            .get(selector)
            .copied()
            .unwrap_or(usize::from(self.matches.contains(selector)));
        Ok((0..count)
            .map(|i| ElementHandle::new(format!("stub:{}:{}", selector, i), selector))
            .collect())
    }

    async fn click(&self, handle: &ElementHandle, _force: bool) -> Result<(), AutomationError> {
        if self.fail_actions {
            return Err(AutomationError::Network(
                "injected click failure".to_string(),
            ));
        }
        self.clicked.lock().push(handle.element_id.clone());
        Ok(())
    }

    async fn fill(
        &self,
        handle: &ElementHandle,
        value: &str,
        _clear_first: bool,
    ) -> Result<(), AutomationError> {
        if self.fail_actions {
            return Err(AutomationError::Network("injected fill failure".to_string()));
        }
        self.filled
            .lock()
            .push((handle.element_id.clone(), value.to_string()));
        Ok(())
    }
}
