//! Fallback-chain resolution engine
//!
//! Each `locate` call is a self-contained linear scan over a chain's
//! selectors: strictly in declared order, one at a time, each under a share of
//! the caller's timeout budget. The first live match wins and is recorded in
//! the hit metrics; a full miss is recorded and surfaced as a single
//! `ElementNotFound`. Repeated attempts are the retry engine's job, not this
//! one's.

use crate::advisor::{self, Suggestion};
use crate::chain::{ChainRegistry, SelectorChain, WaitState};
use crate::driver::{scoped_text_selector, text_selector, ElementHandle, PageContext};
use crate::metrics::{MetricsStore, SelectorHitMetrics};
use std::sync::Arc;
use std::time::{Duration, Instant};
use steadyweb_core_types::AutomationError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

/// Floor for the per-selector share of a timeout budget (milliseconds).
///
/// Dividing a short total timeout across many fallbacks must never starve
/// every attempt into an instant failure.
pub const MIN_PER_SELECTOR_TIMEOUT_MS: u64 = 120;

/// How many selector failure reasons are kept for the miss log
const MAX_LOGGED_REASONS: usize = 3;

/// Per-call options for `locate`/`locate_all` and the action wrappers
#[derive(Debug, Clone, Default)]
pub struct LocateOptions {
    /// Total timeout budget; defaults to the chain's per-selector baseline
    /// multiplied by its selector count
    pub timeout_ms: Option<u64>,

    /// Override of the chain's default wait state
    pub wait_state: Option<WaitState>,

    /// Caller-level cancellation, observed between selector attempts
    pub cancel_token: Option<CancellationToken>,
}

impl LocateOptions {
    /// Create default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total timeout budget
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Override the wait state
    pub fn with_wait_state(mut self, state: WaitState) -> Self {
        self.wait_state = Some(state);
        self
    }

    /// Attach a cancellation token
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }
}

/// Split a total timeout budget across a chain's selectors
fn per_selector_budget(total_ms: u64, selector_count: usize) -> Duration {
    let count = selector_count.max(1) as u64;
    let per_ms = if total_ms < MIN_PER_SELECTOR_TIMEOUT_MS {
        total_ms
    } else {
        (total_ms / count).max(MIN_PER_SELECTOR_TIMEOUT_MS)
    };
    Duration::from_millis(per_ms)
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1_000.0
}

/// Selector resolution engine over a chain registry
///
/// Chains and the registry are shared read-only across concurrent
/// resolutions; hit metrics are updated through the store's per-key entries.
pub struct SelectorEngine {
    registry: Arc<ChainRegistry>,
    metrics: MetricsStore,
}

impl SelectorEngine {
    /// Create an engine over an existing registry
    pub fn new(registry: Arc<ChainRegistry>) -> Self {
        Self {
            registry,
            metrics: MetricsStore::new(),
        }
    }

    /// The underlying chain registry
    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    /// Add or overwrite a chain at runtime.
    ///
    /// Existing metrics for the key are kept; drift history survives one-off
    /// and test-injected re-registrations.
    pub fn register_chain(&self, chain: SelectorChain) -> Result<(), AutomationError> {
        self.registry.register(chain)
    }

    /// Resolve a logical key to a live element handle.
    ///
    /// Walks the chain's selectors strictly in declared order, each under an
    /// equal share of the timeout budget. Fails fast with `ClosedContext`
    /// before any selector attempt when the context is gone.
    pub async fn locate(
        &self,
        ctx: &dyn PageContext,
        key: &str,
        opts: &LocateOptions,
    ) -> Result<ElementHandle, AutomationError> {
        self.ensure_open(ctx, key)?;
        let chain = self.chain_for(key)?;

        let selectors: Vec<String> = chain
            .all_selectors()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let wait_state = opts.wait_state.unwrap_or(chain.wait_state);
        let total_ms = opts
            .timeout_ms
            .unwrap_or(chain.timeout_per_selector_ms * selectors.len() as u64);
        let budget = per_selector_budget(total_ms, selectors.len());

        self.scan(ctx, key, &selectors, wait_state, budget, opts.cancel_token.as_ref())
            .await
            .map(|(_, handle)| handle)
    }

    /// Resolve a logical key to every attached element under the first
    /// selector that produces any match.
    ///
    /// Matches are never merged across selectors; the first selector with at
    /// least one attached element wins and all of its matches are returned.
    pub async fn locate_all(
        &self,
        ctx: &dyn PageContext,
        key: &str,
        opts: &LocateOptions,
    ) -> Result<Vec<ElementHandle>, AutomationError> {
        self.ensure_open(ctx, key)?;
        let chain = self.chain_for(key)?;

        let selectors: Vec<String> = chain
            .all_selectors()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let total_ms = opts
            .timeout_ms
            .unwrap_or(chain.timeout_per_selector_ms * selectors.len() as u64);
        let budget = per_selector_budget(total_ms, selectors.len());

        let op_id = Uuid::new_v4();
        let start = Instant::now();
        let mut reasons: Vec<String> = Vec::new();

        for (index, selector) in selectors.iter().enumerate() {
            self.check_cancelled(opts.cancel_token.as_ref(), key)?;

            match ctx
                .wait_for_selector(selector, WaitState::Attached, budget)
                .await
            {
                Ok(_) => match ctx.query_all(selector).await {
                    Ok(handles) if !handles.is_empty() => {
                        let elapsed = elapsed_ms(start);
                        self.metrics.record_hit(key, index, elapsed);
                        if index > 0 {
                            warn!(
                                %op_id, key, index, selector = selector.as_str(),
                                matches = handles.len(),
                                "locate_all resolved with fallback selector"
                            );
                        } else {
                            debug!(
                                %op_id, key, matches = handles.len(),
                                "locate_all resolved with primary selector"
                            );
                        }
                        return Ok(handles);
                    }
                    Ok(_) => {
                        debug!(%op_id, key, index, "selector attached but query returned nothing");
                    }
                    Err(err) => {
                        push_reason(&mut reasons, index, selector, &err);
                        debug!(%op_id, key, index, error = %err, "query_all failed");
                    }
                },
                Err(err) => {
                    push_reason(&mut reasons, index, selector, &err);
                    debug!(%op_id, key, index, error = %err, "selector failed");
                }
            }
        }

        let elapsed = elapsed_ms(start);
        self.metrics.record_miss(key, elapsed);
        warn!(%op_id, key, elapsed_ms = elapsed, ?reasons, "locate_all exhausted all selectors");
        Err(AutomationError::ElementNotFound(format!(
            "no selector produced matches for '{}' ({} tried)",
            key,
            selectors.len()
        )))
    }

    /// Resolve and click a target.
    ///
    /// Resolution misses and action failures come back as `Ok(false)`; fatal
    /// context and configuration errors still propagate.
    pub async fn click(
        &self,
        ctx: &dyn PageContext,
        key: &str,
        opts: &LocateOptions,
        force: bool,
    ) -> Result<bool, AutomationError> {
        let handle = match self.locate(ctx, key, opts).await {
            Ok(handle) => handle,
            Err(AutomationError::ElementNotFound(reason)) => {
                warn!(key, %reason, "click target did not resolve");
                return Ok(false);
            }
            Err(err) => return Err(err),
        };

        match ctx.click(&handle, force).await {
            Ok(()) => Ok(true),
            Err(err) => {
                warn!(key, error = %err, "click action failed");
                Ok(false)
            }
        }
    }

    /// Resolve a target and fill it with `value`
    pub async fn fill(
        &self,
        ctx: &dyn PageContext,
        key: &str,
        value: &str,
        opts: &LocateOptions,
        clear_first: bool,
    ) -> Result<bool, AutomationError> {
        let handle = match self.locate(ctx, key, opts).await {
            Ok(handle) => handle,
            Err(AutomationError::ElementNotFound(reason)) => {
                warn!(key, %reason, "fill target did not resolve");
                return Ok(false);
            }
            Err(err) => return Err(err),
        };

        match ctx.fill(&handle, value, clear_first).await {
            Ok(()) => Ok(true),
            Err(err) => {
                warn!(key, error = %err, "fill action failed");
                Ok(false)
            }
        }
    }

    /// Open a dropdown via `key`, then click the option matching
    /// `option_text`.
    ///
    /// The option leaf is resolved through a second chain when
    /// `option_chain_key` is given (each of its selectors scoped with a text
    /// filter); otherwise an ad-hoc text locator is the last resort. Option
    /// lists are usually rendered with generic reused selectors, so the text
    /// content is what differentiates the leaf.
    pub async fn select_option(
        &self,
        ctx: &dyn PageContext,
        key: &str,
        option_text: &str,
        opts: &LocateOptions,
        option_chain_key: Option<&str>,
    ) -> Result<bool, AutomationError> {
        let trigger = match self.locate(ctx, key, opts).await {
            Ok(handle) => handle,
            Err(AutomationError::ElementNotFound(reason)) => {
                warn!(key, %reason, "dropdown trigger did not resolve");
                return Ok(false);
            }
            Err(err) => return Err(err),
        };

        if let Err(err) = ctx.click(&trigger, false).await {
            warn!(key, error = %err, "failed to open dropdown");
            return Ok(false);
        }

        let option_handle = match option_chain_key {
            Some(opt_key) => {
                let chain = self.chain_for(opt_key)?;
                let composed: Vec<String> = chain
                    .all_selectors()
                    .iter()
                    .map(|s| scoped_text_selector(s, option_text))
                    .collect();
                let total_ms = opts
                    .timeout_ms
                    .unwrap_or(chain.timeout_per_selector_ms * composed.len() as u64);
                let budget = per_selector_budget(total_ms, composed.len());

                match self
                    .scan(
                        ctx,
                        opt_key,
                        &composed,
                        WaitState::Visible,
                        budget,
                        opts.cancel_token.as_ref(),
                    )
                    .await
                {
                    Ok((_, handle)) => handle,
                    Err(AutomationError::ElementNotFound(reason)) => {
                        warn!(key, option = option_text, %reason, "option did not resolve");
                        return Ok(false);
                    }
                    Err(err) => return Err(err),
                }
            }
            None => {
                let chain = self.chain_for(key)?;
                let selector = text_selector(option_text);
                let budget = Duration::from_millis(chain.timeout_per_selector_ms);
                match ctx
                    .wait_for_selector(&selector, WaitState::Visible, budget)
                    .await
                {
                    Ok(handle) => handle,
                    Err(err) => {
                        warn!(
                            key, option = option_text, error = %err,
                            "ad-hoc option text locator failed"
                        );
                        return Ok(false);
                    }
                }
            }
        };

        match ctx.click(&option_handle, false).await {
            Ok(()) => Ok(true),
            Err(err) => {
                warn!(key, option = option_text, error = %err, "option click failed");
                Ok(false)
            }
        }
    }

    /// Metrics snapshot for one key
    pub fn metrics(&self, key: &str) -> Option<SelectorHitMetrics> {
        self.metrics.snapshot(key)
    }

    /// Metrics snapshots for every tracked key
    pub fn all_metrics(&self) -> Vec<SelectorHitMetrics> {
        self.metrics.snapshot_all()
    }

    /// Drop all hit metrics
    pub fn reset_metrics(&self) {
        self.metrics.reset()
    }

    /// Advisory reordering/fallback suggestions for drifting chains
    pub fn suggest_optimizations(&self) -> Vec<Suggestion> {
        advisor::suggest_optimizations(&self.registry, &self.metrics)
    }

    fn chain_for(&self, key: &str) -> Result<Arc<SelectorChain>, AutomationError> {
        self.registry.get(key).ok_or_else(|| {
            AutomationError::Configuration(format!("unknown selector chain '{}'", key))
        })
    }

    fn ensure_open(&self, ctx: &dyn PageContext, key: &str) -> Result<(), AutomationError> {
        if ctx.is_closed() {
            return Err(AutomationError::ClosedContext(format!(
                "cannot resolve '{}' against a closed context",
                key
            )));
        }
        Ok(())
    }

    fn check_cancelled(
        &self,
        token: Option<&CancellationToken>,
        key: &str,
    ) -> Result<(), AutomationError> {
        if token.is_some_and(|t| t.is_cancelled()) {
            debug!(key, "resolution cancelled between selector attempts");
            return Err(AutomationError::Cancelled(format!(
                "resolution of '{}' cancelled",
                key
            )));
        }
        Ok(())
    }

    /// Linear scan over `selectors`, first success wins.
    ///
    /// Individual selector failures are swallowed into the miss record; only
    /// the aggregate outcome is surfaced.
    async fn scan(
        &self,
        ctx: &dyn PageContext,
        key: &str,
        selectors: &[String],
        wait_state: WaitState,
        budget: Duration,
        cancel: Option<&CancellationToken>,
    ) -> Result<(usize, ElementHandle), AutomationError> {
        let op_id = Uuid::new_v4();
        let start = Instant::now();
        let mut reasons: Vec<String> = Vec::new();

        for (index, selector) in selectors.iter().enumerate() {
            self.check_cancelled(cancel, key)?;

            debug!(
                %op_id, key, index, selector = selector.as_str(),
                state = wait_state.name(), budget_ms = budget.as_millis() as u64,
                "trying selector"
            );

            match ctx.wait_for_selector(selector, wait_state, budget).await {
                Ok(handle) => {
                    let elapsed = elapsed_ms(start);
                    self.metrics.record_hit(key, index, elapsed);
                    if index > 0 {
                        warn!(
                            %op_id, key, index, selector = selector.as_str(),
                            elapsed_ms = elapsed,
                            "resolved with fallback selector, chain is drifting"
                        );
                    } else {
                        debug!(%op_id, key, elapsed_ms = elapsed, "resolved with primary selector");
                    }
                    return Ok((index, handle));
                }
                Err(err) => {
                    push_reason(&mut reasons, index, selector, &err);
                    debug!(%op_id, key, index, error = %err, "selector failed");
                }
            }
        }

        let elapsed = elapsed_ms(start);
        self.metrics.record_miss(key, elapsed);
        warn!(%op_id, key, elapsed_ms = elapsed, ?reasons, "all selectors exhausted");
        Err(AutomationError::ElementNotFound(format!(
            "no selector matched for '{}' ({} tried)",
            key,
            selectors.len()
        )))
    }
}

fn push_reason(reasons: &mut Vec<String>, index: usize, selector: &str, err: &AutomationError) {
    if reasons.len() < MAX_LOGGED_REASONS {
        reasons.push(format!("[{}] {}: {}", index, selector, err));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubPageContext;

    fn engine_with(chain: SelectorChain) -> SelectorEngine {
        let registry = ChainRegistry::new();
        registry.register(chain).unwrap();
        SelectorEngine::new(Arc::new(registry))
    }

    fn abc_chain() -> SelectorChain {
        SelectorChain::new("target", "#a").with_fallbacks(["#b", "#c"])
    }

    #[test]
    fn test_per_selector_budget_floor() {
        // Even split above the floor
        assert_eq!(per_selector_budget(3000, 3), Duration::from_millis(1000));
        // Split would starve attempts, floor kicks in
        assert_eq!(per_selector_budget(200, 5), Duration::from_millis(120));
        // Total below the floor is used as-is
        assert_eq!(per_selector_budget(80, 4), Duration::from_millis(80));
        // Boundary: total equals the floor
        assert_eq!(per_selector_budget(120, 2), Duration::from_millis(120));
        // Degenerate selector count
        assert_eq!(per_selector_budget(500, 0), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_locate_tries_selectors_in_declared_order() {
        let engine = engine_with(abc_chain());
        let ctx = StubPageContext::new().with_match("#c");

        let handle = engine
            .locate(&ctx, "target", &LocateOptions::new())
            .await
            .unwrap();

        assert_eq!(handle.selector, "#c");
        assert_eq!(ctx.waited_selectors(), vec!["#a", "#b", "#c"]);

        let metrics = engine.metrics("target").unwrap();
        assert_eq!(metrics.hits_at(0), 0);
        assert_eq!(metrics.hits_at(1), 0);
        assert_eq!(metrics.hits_at(2), 1);
        assert_eq!(metrics.misses, 0);
    }

    #[tokio::test]
    async fn test_locate_stops_at_first_match() {
        let engine = engine_with(abc_chain());
        let ctx = StubPageContext::new().with_matches(["#a", "#b", "#c"]);

        engine
            .locate(&ctx, "target", &LocateOptions::new())
            .await
            .unwrap();

        assert_eq!(ctx.waited_selectors(), vec!["#a"]);
        assert_eq!(engine.metrics("target").unwrap().hits_at(0), 1);
    }

    #[tokio::test]
    async fn test_locate_miss_records_and_reports_not_found() {
        let engine = engine_with(abc_chain());
        let ctx = StubPageContext::new();

        let err = engine
            .locate(&ctx, "target", &LocateOptions::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AutomationError::ElementNotFound(_)));
        let metrics = engine.metrics("target").unwrap();
        assert_eq!(metrics.misses, 1);
        assert_eq!(metrics.total_attempts(), 1);
    }

    #[tokio::test]
    async fn test_closed_context_fails_without_selector_attempts() {
        let engine = engine_with(abc_chain());
        let ctx = StubPageContext::closed();

        let err = engine
            .locate(&ctx, "target", &LocateOptions::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AutomationError::ClosedContext(_)));
        assert!(ctx.waited_selectors().is_empty());
        assert!(engine.metrics("target").is_none());
    }

    #[tokio::test]
    async fn test_unknown_key_is_configuration_error() {
        let engine = engine_with(abc_chain());
        let ctx = StubPageContext::new();

        let err = engine
            .locate(&ctx, "no_such_key", &LocateOptions::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AutomationError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_locate_cancelled_before_any_attempt() {
        let engine = engine_with(abc_chain());
        let ctx = StubPageContext::new().with_match("#a");
        let token = CancellationToken::new();
        token.cancel();

        let err = engine
            .locate(
                &ctx,
                "target",
                &LocateOptions::new().with_cancel_token(token),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AutomationError::Cancelled(_)));
        assert!(ctx.waited_selectors().is_empty());
        assert!(engine.metrics("target").is_none());
    }

    #[tokio::test]
    async fn test_locate_all_first_matching_selector_wins() {
        let engine = engine_with(SelectorChain::new("rows", ".missing").with_fallbacks(["li.row"]));
        let ctx = StubPageContext::new().with_match_count("li.row", 3);

        let handles = engine
            .locate_all(&ctx, "rows", &LocateOptions::new())
            .await
            .unwrap();

        assert_eq!(handles.len(), 3);
        assert!(handles.iter().all(|h| h.selector == "li.row"));
        assert_eq!(engine.metrics("rows").unwrap().hits_at(1), 1);
    }

    #[tokio::test]
    async fn test_locate_all_miss() {
        let engine = engine_with(abc_chain());
        let ctx = StubPageContext::new();

        let err = engine
            .locate_all(&ctx, "target", &LocateOptions::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AutomationError::ElementNotFound(_)));
        assert_eq!(engine.metrics("target").unwrap().misses, 1);
    }

    #[tokio::test]
    async fn test_click_success_and_resolution_miss() {
        let engine = engine_with(abc_chain());

        let ctx = StubPageContext::new().with_match("#b");
        let clicked = engine
            .click(&ctx, "target", &LocateOptions::new(), false)
            .await
            .unwrap();
        assert!(clicked);
        assert_eq!(ctx.clicked_elements(), vec!["stub:#b"]);

        let empty_ctx = StubPageContext::new();
        let clicked = engine
            .click(&empty_ctx, "target", &LocateOptions::new(), false)
            .await
            .unwrap();
        assert!(!clicked);
    }

    #[tokio::test]
    async fn test_click_action_failure_returns_false() {
        let engine = engine_with(abc_chain());
        let ctx = StubPageContext::new().with_match("#a").failing_actions();

        let clicked = engine
            .click(&ctx, "target", &LocateOptions::new(), false)
            .await
            .unwrap();
        assert!(!clicked);
    }

    #[tokio::test]
    async fn test_click_propagates_closed_context() {
        let engine = engine_with(abc_chain());
        let ctx = StubPageContext::closed();

        let err = engine
            .click(&ctx, "target", &LocateOptions::new(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, AutomationError::ClosedContext(_)));
    }

    #[tokio::test]
    async fn test_fill_writes_value() {
        let engine = engine_with(SelectorChain::new("price", "input[name='price']"));
        let ctx = StubPageContext::new().with_match("input[name='price']");

        let filled = engine
            .fill(&ctx, "price", "19.90", &LocateOptions::new(), true)
            .await
            .unwrap();

        assert!(filled);
        assert_eq!(
            ctx.filled_values(),
            vec![("stub:input[name='price']".to_string(), "19.90".to_string())]
        );
    }

    #[tokio::test]
    async fn test_select_option_via_option_chain() {
        let registry = ChainRegistry::new();
        registry
            .register(SelectorChain::new("status_dropdown", ".el-select"))
            .unwrap();
        registry
            .register(
                SelectorChain::new("status_options", ".el-select-dropdown li")
                    .with_fallbacks(["ul.options li"]),
            )
            .unwrap();
        let engine = SelectorEngine::new(Arc::new(registry));

        let ctx = StubPageContext::new()
            .with_match(".el-select")
            .with_match("ul.options li >> text=已上架");

        let selected = engine
            .select_option(
                &ctx,
                "status_dropdown",
                "已上架",
                &LocateOptions::new(),
                Some("status_options"),
            )
            .await
            .unwrap();

        assert!(selected);
        // Trigger first, then the text-scoped option
        assert_eq!(
            ctx.clicked_elements(),
            vec!["stub:.el-select", "stub:ul.options li >> text=已上架"]
        );
        // The option chain's metrics record the fallback hit
        assert_eq!(engine.metrics("status_options").unwrap().hits_at(1), 1);
    }

    #[tokio::test]
    async fn test_select_option_ad_hoc_text_locator() {
        let engine = engine_with(SelectorChain::new("status_dropdown", ".el-select"));
        let ctx = StubPageContext::new()
            .with_match(".el-select")
            .with_match("text=已下架");

        let selected = engine
            .select_option(&ctx, "status_dropdown", "已下架", &LocateOptions::new(), None)
            .await
            .unwrap();

        assert!(selected);
        assert_eq!(
            ctx.clicked_elements(),
            vec!["stub:.el-select", "stub:text=已下架"]
        );
    }

    #[tokio::test]
    async fn test_select_option_missing_option_returns_false() {
        let engine = engine_with(SelectorChain::new("status_dropdown", ".el-select"));
        let ctx = StubPageContext::new().with_match(".el-select");

        let selected = engine
            .select_option(&ctx, "status_dropdown", "不存在", &LocateOptions::new(), None)
            .await
            .unwrap();

        assert!(!selected);
    }

    #[tokio::test]
    async fn test_select_option_unknown_option_chain_is_config_error() {
        let engine = engine_with(SelectorChain::new("status_dropdown", ".el-select"));
        let ctx = StubPageContext::new().with_match(".el-select");

        let err = engine
            .select_option(
                &ctx,
                "status_dropdown",
                "已上架",
                &LocateOptions::new(),
                Some("missing_chain"),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AutomationError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_register_chain_keeps_existing_metrics() {
        let engine = engine_with(abc_chain());
        let ctx = StubPageContext::new().with_match("#a");
        engine
            .locate(&ctx, "target", &LocateOptions::new())
            .await
            .unwrap();

        engine
            .register_chain(SelectorChain::new("target", "#fresh"))
            .unwrap();

        assert_eq!(engine.metrics("target").unwrap().hits_at(0), 1);
        assert_eq!(engine.registry().get("target").unwrap().primary, "#fresh");
    }

    #[tokio::test]
    async fn test_reset_metrics() {
        let engine = engine_with(abc_chain());
        let ctx = StubPageContext::new().with_match("#a");
        engine
            .locate(&ctx, "target", &LocateOptions::new())
            .await
            .unwrap();

        engine.reset_metrics();
        assert!(engine.metrics("target").is_none());
    }

    #[tokio::test]
    async fn test_suggestions_surface_through_engine() {
        let engine = engine_with(abc_chain());
        let ctx = StubPageContext::new().with_match("#b");

        for _ in 0..20 {
            engine
                .locate(&ctx, "target", &LocateOptions::new())
                .await
                .unwrap();
        }

        let suggestions = engine.suggest_optimizations();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].chain_key, "target");
    }
}
