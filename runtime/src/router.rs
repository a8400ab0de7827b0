//! # Router: Transition Engine and Navigation Facade
//!
//! A `Router` owns the state tree, the active state and the bookkeeping needed
//! to run overlapping transitions safely.
//!
//! A transition runs in three steps:
//!
//! 1. **Diff**: find the deepest level of the current path that can be kept
//!    (same node, same own params). Staying on the same state with nothing to
//!    re-resolve is a no-op.
//! 2. **Resolve**: one shared resolver future per entered state, chained so
//!    each state inherits its parent's values. Nothing global changes here.
//! 3. **Commit**: if no newer transition started meanwhile, locals and
//!    the active state move under the active-state lock without awaiting.
//!    Exit hooks then run deepest-first and enter hooks shallowest-first,
//!    outside that lock, so a hook sees the new state and may query the router.
//!
//! Only the latest transition may commit. An older one settles as
//! [`TransitionOutcome::Superseded`], which is not an error.

use crate::config::RouterConfig;
use crate::error::{ResolveError, TransitionError};
use crate::events::{StartDecision, TransitionEvent, TransitionListener, TransitionPhase};
use crate::injector::{Injector, ServiceMap};
use crate::location::{Location, MemoryLocation};
use crate::resolver::{Resolver, SharedLocals};
use crate::template::{MapTemplateLoader, TemplateLoader};
use crate::url_router::UrlRouter;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;
use waymark_core::{
    Bus, Locals, LookupError, Params, PathMatcherFactory, RegistrationError, StateDefinition,
    StateNode, StateRegistry, StateTarget, UrlMatcherFactory, ViewLocals,
};

/// How a transition call settled when it did not fail.
#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    /// The target state is now active.
    Entered(Arc<StateDefinition>),
    /// Already on the target with identical params; nothing happened.
    Unchanged(Arc<StateDefinition>),
    /// A newer transition took over before this one could commit.
    Superseded,
}

impl TransitionOutcome {
    /// The active state after this transition, if it decided one.
    pub fn state(&self) -> Option<&Arc<StateDefinition>> {
        match self {
            TransitionOutcome::Entered(state) | TransitionOutcome::Unchanged(state) => Some(state),
            TransitionOutcome::Superseded => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, TransitionOutcome::Superseded)
    }
}

#[derive(Debug, Clone)]
pub struct TransitionOptions {
    /// Push the target's URL to the location on success.
    pub location: bool,
    /// Carry over current params of the states shared with the target.
    pub inherit: bool,
    /// Base for relative targets such as `^.sibling`.
    pub relative: Option<Arc<StateNode>>,
}

impl Default for TransitionOptions {
    fn default() -> Self {
        Self {
            location: true,
            inherit: false,
            relative: None,
        }
    }
}

impl TransitionOptions {
    pub fn location(mut self, location: bool) -> Self {
        self.location = location;
        self
    }

    pub fn inherit(mut self, inherit: bool) -> Self {
        self.inherit = inherit;
        self
    }

    pub fn relative(mut self, base: Arc<StateNode>) -> Self {
        self.relative = Some(base);
        self
    }
}

#[derive(Debug, Clone)]
pub struct HrefOptions {
    /// Fall back to the nearest navigable ancestor's URL.
    pub lossy: bool,
    /// Fill in current params of the states shared with the target.
    pub inherit: bool,
    /// Base for relative targets; the current state when `None`.
    pub relative: Option<Arc<StateNode>>,
}

impl Default for HrefOptions {
    fn default() -> Self {
        Self {
            lossy: true,
            inherit: true,
            relative: None,
        }
    }
}

impl HrefOptions {
    pub fn lossy(mut self, lossy: bool) -> Self {
        self.lossy = lossy;
        self
    }

    pub fn inherit(mut self, inherit: bool) -> Self {
        self.inherit = inherit;
        self
    }

    pub fn relative(mut self, base: Arc<StateNode>) -> Self {
        self.relative = Some(base);
        self
    }
}

struct ActiveState {
    current: Arc<StateNode>,
    params: Params,
    /// Token of the only transition still allowed to commit.
    pending: Option<u64>,
    cancel: Option<CancellationToken>,
    /// Bumped on every commit.
    generation: u64,
}

/// A transition that has claimed the pending slot.
struct InFlight {
    id: Uuid,
    token: u64,
    /// Path levels shared with the state active when the slot was claimed.
    keep: usize,
    to: Arc<StateNode>,
    to_params: Params,
    location: bool,
}

/// Releases the pending slot if the transition holding `token` is dropped
/// before it settles.
struct PendingSlot<'a> {
    active: &'a Mutex<ActiveState>,
    token: u64,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        let mut active = self.active.lock();
        if active.pending == Some(self.token) {
            active.pending = None;
            active.cancel = None;
        }
    }
}

pub struct RouterBuilder {
    config: RouterConfig,
    injector: Arc<dyn Injector>,
    templates: Arc<dyn TemplateLoader>,
    bus: Bus,
    location: Arc<dyn Location>,
    matchers: Arc<dyn UrlMatcherFactory>,
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self {
            config: RouterConfig::default(),
            injector: Arc::new(ServiceMap::new()),
            templates: Arc::new(MapTemplateLoader::new()),
            bus: Bus::new(),
            location: Arc::new(MemoryLocation::default()),
            matchers: Arc::new(PathMatcherFactory),
        }
    }
}

impl RouterBuilder {
    pub fn config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn injector(mut self, injector: impl Injector + 'static) -> Self {
        self.injector = Arc::new(injector);
        self
    }

    pub fn templates(mut self, templates: impl TemplateLoader + 'static) -> Self {
        self.templates = Arc::new(templates);
        self
    }

    /// Typed resources handed to every resolve factory.
    pub fn bus(mut self, bus: Bus) -> Self {
        self.bus = bus;
        self
    }

    pub fn location(mut self, location: Arc<dyn Location>) -> Self {
        self.location = location;
        self
    }

    pub fn matchers(mut self, matchers: impl UrlMatcherFactory + 'static) -> Self {
        self.matchers = Arc::new(matchers);
        self
    }

    pub fn build(self) -> Router {
        let registry = StateRegistry::new(self.matchers);
        let root = Arc::clone(registry.root());
        let (events, _) = broadcast::channel(self.config.event_capacity.max(1));
        let (params_tx, _) = watch::channel(Params::new());

        Router {
            registry: RwLock::new(registry),
            url_router: RwLock::new(UrlRouter::new()),
            resolver: Resolver::new(self.injector, self.templates, Arc::new(self.bus)),
            location: self.location,
            config: self.config,
            active: Mutex::new(ActiveState {
                current: root,
                params: Params::new(),
                pending: None,
                cancel: None,
                generation: 0,
            }),
            next_token: AtomicU64::new(1),
            notify: Mutex::new(()),
            listeners: RwLock::new(Vec::new()),
            events,
            params_tx,
        }
    }
}

pub struct Router {
    registry: RwLock<StateRegistry>,
    url_router: RwLock<UrlRouter>,
    resolver: Resolver,
    location: Arc<dyn Location>,
    config: RouterConfig,
    active: Mutex<ActiveState>,
    next_token: AtomicU64,
    /// Held by a settling transition until its notifications are delivered,
    /// so listeners observe commits in order. Taken before `active`.
    notify: Mutex<()>,
    listeners: RwLock<Vec<Arc<dyn TransitionListener>>>,
    events: broadcast::Sender<TransitionEvent>,
    params_tx: watch::Sender<Params>,
}

impl Default for Router {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::default()
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    // --- Registration ---

    /// Register a state. Concrete states with a URL also become reachable
    /// through [`Router::location_changed`].
    pub fn state(
        &self,
        definition: impl Into<Arc<StateDefinition>>,
    ) -> Result<Arc<StateNode>, RegistrationError> {
        let node = self.registry.write().register(definition)?;
        self.url_router.write().when(&node);
        Ok(node)
    }

    /// Register `definition` under `name`, ignoring its own name.
    pub fn state_named(
        &self,
        name: impl Into<String>,
        mut definition: StateDefinition,
    ) -> Result<Arc<StateNode>, RegistrationError> {
        definition.name = name.into();
        self.state(definition)
    }

    // --- Observation ---

    pub fn add_listener(&self, listener: Arc<dyn TransitionListener>) {
        self.listeners.write().push(listener);
    }

    /// Stream of transition events. Slow receivers may observe `Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<TransitionEvent> {
        self.events.subscribe()
    }

    /// Mirror of the committed params, updated on every commit.
    pub fn watch_params(&self) -> watch::Receiver<Params> {
        self.params_tx.subscribe()
    }

    // --- Queries ---

    /// Definition of the active state; the root's before the first commit.
    pub fn current(&self) -> Arc<StateDefinition> {
        Arc::clone(self.active.lock().current.definition())
    }

    pub fn current_node(&self) -> Arc<StateNode> {
        Arc::clone(&self.active.lock().current)
    }

    pub fn params(&self) -> Params {
        self.active.lock().params.clone()
    }

    /// Whether a transition is resolving and may still commit.
    pub fn is_transitioning(&self) -> bool {
        self.active.lock().pending.is_some()
    }

    /// Registered definitions, sorted by name.
    pub fn states(&self) -> Vec<Arc<StateDefinition>> {
        let registry = self.registry.read();
        let mut states: Vec<_> = registry
            .states()
            .map(|node| Arc::clone(node.definition()))
            .collect();
        states.sort_by(|a, b| a.name.cmp(&b.name));
        states
    }

    pub fn find(
        &self,
        target: impl Into<StateTarget>,
        relative: Option<&Arc<StateNode>>,
    ) -> Result<Option<Arc<StateNode>>, LookupError> {
        self.registry.read().find(&target.into(), relative)
    }

    /// The user-facing definition of a state.
    pub fn get(&self, target: impl Into<StateTarget>) -> Option<Arc<StateDefinition>> {
        self.lookup(target.into())
            .map(|node| Arc::clone(node.definition()))
    }

    /// `Some(true)` if `target` is the active state, `None` if it is unknown.
    pub fn is(&self, target: impl Into<StateTarget>) -> Option<bool> {
        let node = self.lookup(target.into())?;
        Some(Arc::ptr_eq(&node, &self.active.lock().current))
    }

    /// `Some(true)` if `target` is the active state or one of its ancestors.
    pub fn includes(&self, target: impl Into<StateTarget>) -> Option<bool> {
        let node = self.lookup(target.into())?;
        Some(self.active.lock().current.includes(node.name()))
    }

    fn lookup(&self, target: StateTarget) -> Option<Arc<StateNode>> {
        match self.registry.read().find(&target, None) {
            Ok(found) => found,
            Err(err) => {
                tracing::debug!(%err, "State lookup failed");
                None
            }
        }
    }

    /// Resolved locals of the active view `name` (`view@state`), searching
    /// from the deepest active state up.
    pub fn view(&self, name: &str) -> Option<Arc<ViewLocals>> {
        self.current_node()
            .path()
            .iter()
            .rev()
            .find_map(|node| node.locals()?.view(name).cloned())
    }

    /// Format a link to `target` without navigating.
    ///
    /// `None` when the state is unknown or has no URL to format.
    pub fn href(
        &self,
        target: impl Into<StateTarget>,
        params: Params,
        options: HrefOptions,
    ) -> Option<String> {
        let (current, current_params) = {
            let active = self.active.lock();
            (Arc::clone(&active.current), active.params.clone())
        };
        let base = options.relative.unwrap_or_else(|| Arc::clone(&current));
        let state = match self.registry.read().find(&target.into(), Some(&base)) {
            Ok(found) => found?,
            Err(err) => {
                tracing::debug!(%err, "href lookup failed");
                return None;
            }
        };

        let params = if options.inherit {
            inherit_params(&current, &current_params, &state, params)
        } else {
            params
        };
        let nav = if options.lossy {
            state.navigable()?
        } else {
            Arc::clone(&state)
        };
        let url = nav.url()?.format(&params.restrict(state.params()));

        if self.config.html5_mode {
            Some(url)
        } else {
            Some(format!("{}{}", self.config.hash_prefix, url))
        }
    }

    // --- Navigation ---

    /// Navigate relative to the current state, keeping the params of shared
    /// ancestors. `options.inherit` is always on; `options.relative` defaults
    /// to the current state.
    pub async fn go(
        &self,
        target: impl Into<StateTarget>,
        params: Params,
        mut options: TransitionOptions,
    ) -> Result<TransitionOutcome, TransitionError> {
        options.inherit = true;
        if options.relative.is_none() {
            options.relative = Some(self.current_node());
        }
        self.transition_to(target, params, options).await
    }

    /// Move to `target`, resolving everything it needs first.
    pub async fn transition_to(
        &self,
        target: impl Into<StateTarget>,
        params: Params,
        options: TransitionOptions,
    ) -> Result<TransitionOutcome, TransitionError> {
        let target = target.into();
        let id = Uuid::new_v4();
        let span = tracing::info_span!(
            "Transition",
            waymark.transition = %id,
            waymark.target = %target
        );
        self.run_transition(id, target, params, options)
            .instrument(span)
            .await
    }

    async fn run_transition(
        &self,
        id: Uuid,
        target: StateTarget,
        params: Params,
        options: TransitionOptions,
    ) -> Result<TransitionOutcome, TransitionError> {
        let to = self
            .find(target.clone(), options.relative.as_ref())?
            .ok_or_else(|| TransitionError::UnknownState(target.to_string()))?;
        if to.is_abstract() {
            return Err(TransitionError::AbstractState(to.name().to_string()));
        }
        let to_path = to.path();

        let (from, from_params, generation, to_params, mut keep) = {
            let mut active = self.active.lock();
            let mut to_params = params;
            if options.inherit {
                to_params = inherit_params(&active.current, &active.params, &to, to_params);
            }
            let to_params = to_params.restrict(to.params());
            let keep = kept_levels(&active.current.path(), &active.params, &to_path, &to_params);

            if Arc::ptr_eq(&active.current, &to) && keep == to_path.len() {
                self.abandon_pending(&mut active);
                tracing::debug!("Already in target state");
                return Ok(TransitionOutcome::Unchanged(Arc::clone(to.definition())));
            }
            (
                Arc::clone(&active.current),
                active.params.clone(),
                active.generation,
                to_params,
                keep,
            )
        };

        let start = transition_event(id, TransitionPhase::Start, &from, &from_params, &to, &to_params);
        if self.notify_start(&start) == StartDecision::Prevent {
            tracing::info!(from = %from, "Transition prevented");
            return Err(TransitionError::Prevented {
                from: from.name().to_string(),
                to: to.name().to_string(),
            });
        }

        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let seed = {
            let mut active = self.active.lock();
            if active.generation != generation {
                keep = kept_levels(&active.current.path(), &active.params, &to_path, &to_params);
                if Arc::ptr_eq(&active.current, &to) && keep == to_path.len() {
                    self.abandon_pending(&mut active);
                    tracing::debug!("Target committed while starting");
                    return Ok(TransitionOutcome::Unchanged(Arc::clone(to.definition())));
                }
            }
            self.abandon_pending(&mut active);
            active.pending = Some(token);
            active.cancel = Some(cancel.clone());

            let base = match keep {
                0 => to_path.first().and_then(|top| top.parent().cloned()),
                n => to_path.get(n - 1).cloned(),
            };
            base.and_then(|node| node.locals())
                .unwrap_or_else(|| Arc::new(Locals::root()))
        };

        let _slot = PendingSlot {
            active: &self.active,
            token,
        };

        let mut resolved = Resolver::ready(seed);
        let mut entering: Vec<(Arc<StateNode>, SharedLocals)> = Vec::with_capacity(to_path.len() - keep);
        for node in &to_path[keep..] {
            resolved = self.resolver.resolve_state(node, &to_params, resolved);
            entering.push((Arc::clone(node), resolved.clone()));
        }
        tracing::debug!(keep, entering = entering.len(), "Resolving states");

        let settled = if self.config.cancel_superseded {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = resolved => Some(result),
            }
        } else {
            Some(resolved.await)
        };
        let Some(result) = settled else {
            tracing::info!("Transition superseded while resolving");
            return Ok(TransitionOutcome::Superseded);
        };

        let flight = InFlight {
            id,
            token,
            keep,
            to,
            to_params,
            location: options.location,
        };
        if let Err(reason) = result {
            return self.fail(&flight, reason);
        }

        // Every link settled with the last one, so these complete immediately.
        let mut entered = Vec::with_capacity(entering.len());
        for (node, locals) in entering {
            entered.push((node, locals.await.map_err(TransitionError::Resolve)?));
        }

        Ok(self.commit(flight, entered))
    }

    fn commit(&self, flight: InFlight, entered: Vec<(Arc<StateNode>, Arc<Locals>)>) -> TransitionOutcome {
        let InFlight {
            id,
            token,
            keep,
            to,
            to_params,
            location,
        } = flight;

        let _order = self.notify.lock();
        let (from, from_params, exited) = {
            let mut active = self.active.lock();
            if active.pending != Some(token) {
                tracing::info!("Transition superseded before commit");
                return TransitionOutcome::Superseded;
            }

            let from = Arc::clone(&active.current);
            let exited: Vec<_> = from
                .path()
                .iter()
                .skip(keep)
                .rev()
                .map(|exiting| (Arc::clone(exiting), exiting.set_locals(None)))
                .collect();
            for (entering, locals) in &entered {
                entering.set_locals(Some(Arc::clone(locals)));
            }

            let from_params = std::mem::replace(&mut active.params, to_params.clone());
            active.current = Arc::clone(&to);
            active.pending = None;
            active.cancel = None;
            active.generation += 1;
            self.params_tx.send_replace(to_params.clone());

            if location {
                if let Some(nav) = to.navigable() {
                    if let Some(url) = nav.url() {
                        self.location.push(&url.format(&to_params.restrict(nav.params())));
                    }
                }
            }
            (from, from_params, exited)
        };

        // Hooks run outside the active lock so they can query the router.
        for (exiting, locals) in &exited {
            if let (Some(on_exit), Some(locals)) = (&exiting.definition().on_exit, locals) {
                on_exit(locals.globals());
            }
        }
        for (entering, locals) in &entered {
            if let Some(on_enter) = &entering.definition().on_enter {
                on_enter(locals.globals());
            }
        }

        tracing::info!(from = %from, to = %to, "Transition committed");
        let event = transition_event(id, TransitionPhase::Success, &from, &from_params, &to, &to_params);
        for listener in self.listeners() {
            listener.on_success(&event);
        }
        let _ = self.events.send(event);

        TransitionOutcome::Entered(Arc::clone(to.definition()))
    }

    fn fail(&self, flight: &InFlight, reason: Arc<ResolveError>) -> Result<TransitionOutcome, TransitionError> {
        let _order = self.notify.lock();
        let (from, from_params) = {
            let mut active = self.active.lock();
            if active.pending != Some(flight.token) {
                tracing::info!("Superseded transition failed to resolve");
                return Ok(TransitionOutcome::Superseded);
            }
            active.pending = None;
            active.cancel = None;
            (Arc::clone(&active.current), active.params.clone())
        };

        tracing::warn!(error = %reason, "Transition failed");
        let mut event = transition_event(
            flight.id,
            TransitionPhase::Error,
            &from,
            &from_params,
            &flight.to,
            &flight.to_params,
        );
        event.error = Some(reason.to_string());
        for listener in self.listeners() {
            listener.on_error(&event, &reason);
        }
        let _ = self.events.send(event);

        Err(TransitionError::Resolve(reason))
    }

    fn notify_start(&self, event: &TransitionEvent) -> StartDecision {
        let mut decision = StartDecision::Proceed;
        for listener in self.listeners() {
            if listener.on_start(event) == StartDecision::Prevent {
                decision = StartDecision::Prevent;
            }
        }
        let _ = self.events.send(event.clone());
        decision
    }

    fn listeners(&self) -> Vec<Arc<dyn TransitionListener>> {
        self.listeners.read().clone()
    }

    /// Make sure the pending transition, if any, can no longer commit.
    fn abandon_pending(&self, active: &mut ActiveState) {
        active.pending = None;
        if let Some(cancel) = active.cancel.take() {
            if self.config.cancel_superseded {
                cancel.cancel();
            }
        }
    }

    // --- Location ---

    /// React to a location change: route `url` to the state whose pattern
    /// matches, falling back to `default_url`.
    pub async fn location_changed(&self, url: &str) -> Result<TransitionOutcome, TransitionError> {
        let routed = self.url_router.read().find(url);
        let (state, params) = match routed {
            Some(found) => found,
            None => {
                let fallback = self
                    .config
                    .default_url
                    .as_deref()
                    .filter(|fallback| *fallback != url)
                    .and_then(|fallback| {
                        let found = self.url_router.read().find(fallback)?;
                        Some((fallback, found))
                    });
                let Some((fallback, found)) = fallback else {
                    tracing::warn!(url, "No state matches url");
                    return Err(TransitionError::NoRoute(url.to_string()));
                };
                tracing::debug!(url, fallback, "Redirecting unmatched url");
                self.location.replace(fallback);
                found
            }
        };

        let unchanged = {
            let active = self.active.lock();
            let on_state = active
                .current
                .navigable()
                .is_some_and(|nav| Arc::ptr_eq(&nav, &state));
            (on_state && params.equal_for_keys(&active.params, None))
                .then(|| Arc::clone(active.current.definition()))
        };
        if let Some(current) = unchanged {
            return Ok(TransitionOutcome::Unchanged(current));
        }

        self.transition_to(state, params, TransitionOptions::default().location(false))
            .await
    }

    /// Route the location's current URL.
    pub async fn sync(&self) -> Result<TransitionOutcome, TransitionError> {
        let url = self.location.url();
        self.location_changed(&url).await
    }
}

/// Number of leading path levels that survive a move from `from_path` to
/// `to_path`.
fn kept_levels(
    from_path: &[Arc<StateNode>],
    from_params: &Params,
    to_path: &[Arc<StateNode>],
    to_params: &Params,
) -> usize {
    from_path
        .iter()
        .zip(to_path)
        .take_while(|(from, to)| {
            Arc::ptr_eq(from, to) && to_params.equal_for_keys(from_params, Some(to.own_params()))
        })
        .count()
}

/// `explicit` on top of the current values of every param declared by a
/// state that both `current` and `to` descend through.
fn inherit_params(
    current: &Arc<StateNode>,
    current_params: &Params,
    to: &Arc<StateNode>,
    explicit: Params,
) -> Params {
    let mut inherited = Params::new();
    for (from, to) in current.path().iter().zip(to.path().iter()) {
        if !Arc::ptr_eq(from, to) {
            break;
        }
        for name in to.own_params() {
            if current_params.contains_key(name) {
                inherited.insert(name.clone(), current_params.get(name).map(str::to_owned));
            }
        }
    }
    inherited.merged(&explicit)
}

fn transition_event(
    id: Uuid,
    phase: TransitionPhase,
    from: &StateNode,
    from_params: &Params,
    to: &StateNode,
    to_params: &Params,
) -> TransitionEvent {
    TransitionEvent {
        id,
        phase,
        timestamp: chrono::Utc::now(),
        from: from.name().to_string(),
        from_params: from_params.clone(),
        to: to.name().to_string(),
        to_params: to_params.clone(),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog_router() -> Router {
        let router = Router::default();
        router.state(StateDefinition::new("home").url("/")).unwrap();
        router.state(StateDefinition::new("user").url("/user/:id")).unwrap();
        router.state(StateDefinition::new("user.posts").url("/posts?page")).unwrap();
        router.state(StateDefinition::new("user.about").url("/about")).unwrap();
        router
    }

    #[test]
    fn kept_levels_stop_at_changed_params() {
        let router = blog_router();
        let posts = router.find("user.posts", None).unwrap().unwrap();
        let about = router.find("user.about", None).unwrap().unwrap();

        let a = Params::new().with("id", 1).with("page", 1);
        let b = Params::new().with("id", 1);
        assert_eq!(kept_levels(&posts.path(), &a, &about.path(), &b), 1);

        let c = Params::new().with("id", 2);
        assert_eq!(kept_levels(&posts.path(), &a, &about.path(), &c), 0);
        assert_eq!(kept_levels(&posts.path(), &a, &posts.path(), &a), 2);
    }

    #[test]
    fn inherit_params_only_from_shared_states() {
        let router = blog_router();
        let posts = router.find("user.posts", None).unwrap().unwrap();
        let about = router.find("user.about", None).unwrap().unwrap();
        let home = router.find("home", None).unwrap().unwrap();
        let current = Params::new().with("id", 7).with("page", 3);

        let to_about = inherit_params(&posts, &current, &about, Params::new());
        assert_eq!(to_about.get("id"), Some("7"));
        assert!(!to_about.contains_key("page"));

        let explicit = inherit_params(&posts, &current, &about, Params::new().with("id", 9));
        assert_eq!(explicit.get("id"), Some("9"));

        assert!(inherit_params(&posts, &current, &home, Params::new()).is_empty());
    }

    #[test]
    fn queries_before_any_transition() {
        let router = blog_router();
        assert_eq!(router.current().name, "");
        assert_eq!(router.is("home"), Some(false));
        assert_eq!(router.includes("home"), Some(false));
        assert_eq!(router.is("nope"), None);
        assert_eq!(router.includes("nope"), None);
        assert!(router.get("user.posts").is_some());
        assert!(router.get("nope").is_none());
        assert!(!router.is_transitioning());

        let names: Vec<String> = router.states().iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, ["home", "user", "user.about", "user.posts"]);
    }

    #[test]
    fn href_formats_with_hash_prefix() {
        let router = blog_router();
        assert_eq!(
            router.href("user.posts", Params::new().with("id", 1).with("page", 2), HrefOptions::default()),
            Some("#/user/1/posts?page=2".to_string())
        );
        assert_eq!(router.href("nope", Params::new(), HrefOptions::default()), None);
    }

    #[test]
    fn href_lossy_uses_navigable_ancestor() {
        let router = blog_router();
        router.state(StateDefinition::new("user.modal")).unwrap();

        let lossy = router.href("user.modal", Params::new().with("id", 5), HrefOptions::default());
        assert_eq!(lossy.as_deref(), Some("#/user/5"));

        let strict = router.href(
            "user.modal",
            Params::new().with("id", 5),
            HrefOptions::default().lossy(false),
        );
        assert_eq!(strict, None);
    }

    #[test]
    fn href_in_html5_mode_has_no_prefix() {
        let router = Router::builder()
            .config(RouterConfig {
                html5_mode: true,
                ..RouterConfig::default()
            })
            .build();
        router.state(StateDefinition::new("home").url("/")).unwrap();
        assert_eq!(
            router.href("home", Params::new(), HrefOptions::default()).as_deref(),
            Some("/")
        );
    }

    #[test]
    fn state_named_overrides_definition_name() {
        let router = Router::default();
        let node = router
            .state_named("contacts", StateDefinition::new("ignored").url("/contacts"))
            .unwrap();
        assert_eq!(node.name(), "contacts");
        assert!(router.get("ignored").is_none());
    }

    #[test]
    fn outcome_accessors() {
        let def = Arc::new(StateDefinition::new("home"));
        assert_eq!(TransitionOutcome::Entered(Arc::clone(&def)).state().unwrap().name, "home");
        assert!(TransitionOutcome::Superseded.is_superseded());
        assert!(TransitionOutcome::Superseded.state().is_none());
    }
}
