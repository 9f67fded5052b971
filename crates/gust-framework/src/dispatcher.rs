//! Event dispatcher and subscription registry.
//!
//! The [`Dispatcher`] owns every listener registration of one client and
//! delivers decoded events to them. It moves through four states:
//!
//! ```text
//! Unconfigured ──configure──▶ Configured ──start──▶ Running ──shutdown──▶ Shutdown
//! ```
//!
//! Subscribing is allowed once configured; dispatching only while running.
//!
//! # Capability checks
//!
//! Every subscription is checked against the declared intents when it is
//! made. A listener for an event kind the gateway will never send is an
//! error at registration time, not a silent no-op.
//!
//! # Registry
//!
//! The registry is copy-on-write. Writers clone the kind map and swap it in;
//! each dispatch works on one immutable snapshot, so unsubscribing during a
//! dispatch only affects later events.
//!
//! # Shutdown
//!
//! [`Dispatcher::shutdown`] first waits for in-flight dispatches, then for
//! spawned async listeners. An async listener may shut down its own
//! dispatcher: that call returns once dispatches have drained and does not
//! wait for the listener tasks, its own included. Another caller's shutdown
//! still waits for all of them.
//!
//! ```rust,ignore
//! let dispatcher = Dispatcher::new();
//! dispatcher.configure(Intents::GUILDS | Intents::GUILD_BANS, RequirementTable::new())?;
//!
//! let handle = dispatcher.subscribe(|event: EventContext<BanCreateEvent>| {
//!     println!("{} was banned", event.user().tag());
//! })?;
//!
//! dispatcher.start()?;
//! dispatcher.dispatch(event)?;
//! dispatcher.unsubscribe(&handle);
//! dispatcher.shutdown().await;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use gust_core::{
    Event, EventContext, EventFamily, EventKind, GatewayEvent, Intents, Requirement,
    RequirementTable, ShardId,
};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{Instrument, Level, debug, debug_span, error, info, span, warn};

use crate::diagnostic::{Diagnostic, FailureCause, ListenerFailure};
use crate::error::{DispatchError, DispatchResult};
use crate::listener::{
    Failure, IntoListenerResult, Listener, Predicate, call_async, call_sync, check_predicate,
};
use crate::subscription::{Subscription, SubscriptionHandle, SubscriptionId};

tokio::task_local! {
    /// The dispatcher that spawned the current listener task.
    static LISTENER_OF: usize;
}

/// Default number of diagnostics buffered per receiver.
pub const DEFAULT_DIAGNOSTICS_CAPACITY: usize = 256;

// ============================================================================
// State
// ============================================================================

/// Lifecycle state of a [`Dispatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatcherState {
    Unconfigured,
    Configured,
    Running,
    Shutdown,
}

impl fmt::Display for DispatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unconfigured => "unconfigured",
            Self::Configured => "configured",
            Self::Running => "running",
            Self::Shutdown => "shut down",
        })
    }
}

type Registry = HashMap<EventKind, Vec<Arc<Subscription>>>;

#[derive(Debug, Default)]
struct Capabilities {
    intents: Intents,
    table: RequirementTable,
}

struct Shared {
    state: RwLock<DispatcherState>,
    capabilities: RwLock<Capabilities>,
    registry: RwLock<Arc<Registry>>,
    next_id: AtomicU64,
    in_flight: TaskTracker,
    listeners: TaskTracker,
    shutdown: CancellationToken,
    diagnostics: broadcast::Sender<Diagnostic>,
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Routes decoded events to registered listeners.
///
/// `Dispatcher` is cheap to clone; clones share the same registry and state.
#[derive(Clone)]
pub struct Dispatcher {
    shared: Arc<Shared>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Creates an unconfigured dispatcher.
    pub fn new() -> Self {
        Self::with_diagnostics_capacity(DEFAULT_DIAGNOSTICS_CAPACITY)
    }

    /// Creates an unconfigured dispatcher with a custom diagnostics buffer.
    pub fn with_diagnostics_capacity(capacity: usize) -> Self {
        let (diagnostics, _) = broadcast::channel(capacity.max(1));
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(DispatcherState::Unconfigured),
                capabilities: RwLock::new(Capabilities::default()),
                registry: RwLock::new(Arc::new(Registry::new())),
                next_id: AtomicU64::new(1),
                in_flight: TaskTracker::new(),
                listeners: TaskTracker::new(),
                shutdown: CancellationToken::new(),
                diagnostics,
            }),
        }
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Fixes the declared intents and requirement table.
    ///
    /// Both are immutable afterwards.
    pub fn configure(&self, intents: Intents, table: RequirementTable) -> DispatchResult<()> {
        let mut state = self.shared.state.write();
        if *state != DispatcherState::Unconfigured {
            return Err(DispatchError::invalid_state("configure", *state));
        }

        let privileged = intents.privileged();
        if !privileged.is_empty() {
            info!(%privileged, "privileged intents declared");
        }
        debug!(%intents, "dispatcher configured");

        *self.shared.capabilities.write() = Capabilities { intents, table };
        *state = DispatcherState::Configured;
        Ok(())
    }

    /// Starts accepting events. Calling it while running is a no-op.
    pub fn start(&self) -> DispatchResult<()> {
        let mut state = self.shared.state.write();
        match *state {
            DispatcherState::Configured => {
                *state = DispatcherState::Running;
                debug!("dispatcher running");
                Ok(())
            }
            DispatcherState::Running => Ok(()),
            other => Err(DispatchError::invalid_state("start", other)),
        }
    }

    /// Stops the dispatcher, drops every subscription and waits for in-flight
    /// dispatches and spawned listener tasks to finish.
    ///
    /// Called from one of this dispatcher's async listeners, it waits for
    /// dispatches only.
    pub async fn shutdown(&self) {
        {
            let mut registry = self.shared.registry.write();
            let mut state = self.shared.state.write();
            if *state != DispatcherState::Shutdown {
                info!(previous = %*state, "dispatcher shutting down");
            }
            *state = DispatcherState::Shutdown;
            *registry = Arc::new(Registry::new());
        }

        self.shared.shutdown.cancel();
        self.shared.in_flight.close();
        self.shared.in_flight.wait().await;

        self.shared.listeners.close();
        if self.in_own_listener() {
            debug!("shutdown from a listener, not waiting for listener tasks");
            return;
        }
        self.shared.listeners.wait().await;
        debug!("dispatcher drained");
    }

    fn id(&self) -> usize {
        Arc::as_ptr(&self.shared) as usize
    }

    fn in_own_listener(&self) -> bool {
        LISTENER_OF.try_with(|owner| *owner == self.id()).unwrap_or(false)
    }

    pub fn state(&self) -> DispatcherState {
        *self.shared.state.read()
    }

    pub fn is_shutdown(&self) -> bool {
        self.state() == DispatcherState::Shutdown
    }

    /// A token cancelled when the dispatcher shuts down.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shared.shutdown.clone()
    }

    // ------------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------------

    /// The intents this dispatcher was configured with.
    pub fn declared_intents(&self) -> Intents {
        self.shared.capabilities.read().intents
    }

    /// The requirement of a concrete kind under the configured table.
    pub fn required_capabilities(&self, kind: EventKind) -> Requirement {
        self.shared.capabilities.read().table.required_capabilities(kind)
    }

    /// Number of live registrations for `kind`.
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.shared.registry.read().get(&kind).map_or(0, Vec::len)
    }

    /// Subscribes to the diagnostics channel.
    pub fn diagnostics(&self) -> broadcast::Receiver<Diagnostic> {
        self.shared.diagnostics.subscribe()
    }

    /// Publishes a diagnostic. Dropped silently when nobody listens.
    pub fn report(&self, diagnostic: Diagnostic) {
        let _ = self.shared.diagnostics.send(diagnostic);
    }

    // ------------------------------------------------------------------------
    // Subscribe
    // ------------------------------------------------------------------------

    /// Registers a synchronous listener for one concrete kind.
    pub fn subscribe<E, F, R>(&self, listener: F) -> DispatchResult<SubscriptionHandle>
    where
        E: Event,
        F: Fn(EventContext<E>) -> R + Send + Sync + 'static,
        R: IntoListenerResult,
    {
        self.subscribe_raw(E::KIND, None, Listener::typed(listener))
    }

    /// Registers a synchronous listener that only sees events matching `predicate`.
    pub fn subscribe_filtered<E, P, F, R>(
        &self,
        predicate: P,
        listener: F,
    ) -> DispatchResult<SubscriptionHandle>
    where
        E: Event,
        P: Fn(&E) -> bool + Send + Sync + 'static,
        F: Fn(EventContext<E>) -> R + Send + Sync + 'static,
        R: IntoListenerResult,
    {
        self.subscribe_raw(E::KIND, Some(typed_predicate(predicate)), Listener::typed(listener))
    }

    /// Registers an asynchronous listener for one concrete kind.
    pub fn subscribe_async<E, F, Fut, R>(&self, listener: F) -> DispatchResult<SubscriptionHandle>
    where
        E: Event,
        F: Fn(EventContext<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoListenerResult,
    {
        self.subscribe_raw(E::KIND, None, Listener::typed_async(listener))
    }

    /// Registers an asynchronous listener that only sees events matching `predicate`.
    pub fn subscribe_async_filtered<E, P, F, Fut, R>(
        &self,
        predicate: P,
        listener: F,
    ) -> DispatchResult<SubscriptionHandle>
    where
        E: Event,
        P: Fn(&E) -> bool + Send + Sync + 'static,
        F: Fn(EventContext<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoListenerResult,
    {
        self.subscribe_raw(
            E::KIND,
            Some(typed_predicate(predicate)),
            Listener::typed_async(listener),
        )
    }

    /// Registers an erased listener for one concrete kind.
    pub fn subscribe_raw(
        &self,
        kind: EventKind,
        predicate: Option<Predicate>,
        listener: Listener,
    ) -> DispatchResult<SubscriptionHandle> {
        let mut registry = self.shared.registry.write();
        self.ensure_subscribable()?;

        let capabilities = self.shared.capabilities.read();
        let requirement = capabilities.table.required_capabilities(kind);
        ensure_satisfiable(kind, requirement, capabilities.intents)?;

        Ok(self.insert(&mut registry, vec![kind], predicate, listener))
    }

    /// Registers one listener for every kind of `family` that the declared
    /// intents can deliver.
    pub fn subscribe_family(
        &self,
        family: EventFamily,
        listener: Listener,
    ) -> DispatchResult<SubscriptionHandle> {
        let mut registry = self.shared.registry.write();
        self.ensure_subscribable()?;

        let capabilities = self.shared.capabilities.read();
        let declared = capabilities.intents;
        let requirement = capabilities.table.family_requirement(family);
        ensure_satisfiable(family, requirement, declared)?;

        let kinds: Vec<EventKind> = family
            .kinds()
            .iter()
            .copied()
            .filter(|kind| {
                capabilities
                    .table
                    .required_capabilities(*kind)
                    .is_satisfied_by(declared)
            })
            .collect();

        if kinds.is_empty() {
            let requirement = Requirement::AnyOf(
                family
                    .kinds()
                    .iter()
                    .map(|kind| capabilities.table.required_capabilities(*kind).intents())
                    .collect(),
            );
            return Err(DispatchError::UnsatisfiableCapability {
                target: family.to_string(),
                requirement,
                declared,
                missing: requirement.missing_from(declared),
            });
        }

        debug!(%family, kinds = kinds.len(), "family subscription");
        Ok(self.insert(&mut registry, kinds, None, listener))
    }

    /// Removes a subscription. Returns `false` if it was already removed.
    pub fn unsubscribe(&self, handle: &SubscriptionHandle) -> bool {
        let mut registry = self.shared.registry.write();
        let mut next = Registry::clone(&registry);
        let mut removed = false;

        for kind in &handle.kinds {
            if let Some(subscriptions) = next.get_mut(kind) {
                let before = subscriptions.len();
                subscriptions.retain(|subscription| subscription.id != handle.id);
                removed |= subscriptions.len() != before;
                if subscriptions.is_empty() {
                    next.remove(kind);
                }
            }
        }

        if removed {
            *registry = Arc::new(next);
            debug!(subscription = %handle.id, "unsubscribed");
        }
        removed
    }

    fn ensure_subscribable(&self) -> DispatchResult<()> {
        match self.state() {
            DispatcherState::Configured | DispatcherState::Running => Ok(()),
            other => Err(DispatchError::invalid_state("subscribe", other)),
        }
    }

    fn insert(
        &self,
        registry: &mut Arc<Registry>,
        kinds: Vec<EventKind>,
        predicate: Option<Predicate>,
        listener: Listener,
    ) -> SubscriptionHandle {
        let id = SubscriptionId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let mut next = Registry::clone(registry);
        for kind in &kinds {
            next.entry(*kind).or_default().push(Subscription::new(
                id,
                *kind,
                predicate.clone(),
                listener.clone(),
            ));
        }
        *registry = Arc::new(next);

        debug!(subscription = %id, kinds = ?kinds, is_async = listener.is_async(), "subscribed");
        SubscriptionHandle { id, kinds }
    }

    // ------------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------------

    /// Delivers `event` to every matching listener in registration order.
    ///
    /// Synchronous listeners run inline; asynchronous listeners are spawned
    /// on the dispatcher's task tracker and must be called from within a
    /// Tokio runtime. Listener failures are reported on the diagnostics
    /// channel and never returned. Returns the number of listeners invoked.
    pub fn dispatch(&self, event: GatewayEvent) -> DispatchResult<usize> {
        let _in_flight = self.shared.in_flight.token();
        let state = self.state();
        if state != DispatcherState::Running {
            return Err(DispatchError::invalid_state("dispatch", state));
        }

        let kind = event.kind();
        let shard = event.shard();
        let span = span!(Level::DEBUG, "dispatch", %kind, %shard);
        let _enter = span.enter();

        let (requirement, declared) = {
            let capabilities = self.shared.capabilities.read();
            (capabilities.table.required_capabilities(kind), capabilities.intents)
        };
        if !requirement.is_satisfied_by(declared) {
            warn!(%requirement, %declared, "event outside declared intents, not delivered");
            self.report(Diagnostic::CapabilityViolation {
                kind,
                shard,
                requirement,
            });
            return Ok(0);
        }

        let snapshot = Arc::clone(&*self.shared.registry.read());
        let Some(subscriptions) = snapshot.get(&kind) else {
            debug!("no listeners");
            return Ok(0);
        };

        let mut delivered = 0;
        for subscription in subscriptions {
            if let Some(predicate) = &subscription.predicate {
                match check_predicate(predicate, &event) {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(failure) => {
                        report_failure(&self.shared.diagnostics, subscription, shard, failure);
                        continue;
                    }
                }
            }

            delivered += 1;
            match &subscription.listener {
                Listener::Sync(f) => {
                    if let Err(failure) = call_sync(f.as_ref(), &event) {
                        report_failure(&self.shared.diagnostics, subscription, shard, failure);
                    }
                }
                Listener::Async(f) => {
                    let f = Arc::clone(f);
                    let event = event.clone();
                    let subscription = Arc::clone(subscription);
                    let diagnostics = self.shared.diagnostics.clone();
                    let task_span = debug_span!("listener", subscription = %subscription.id);
                    let task = async move {
                        if let Err(failure) = call_async(f.as_ref(), event).await {
                            report_failure(&diagnostics, &subscription, shard, failure);
                        }
                    };
                    self.shared
                        .listeners
                        .spawn(LISTENER_OF.scope(self.id(), task).instrument(task_span));
                }
            }
        }

        debug!(delivered, "dispatch complete");
        Ok(delivered)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("state", &self.state())
            .field("intents", &self.declared_intents())
            .field("kinds", &self.shared.registry.read().len())
            .finish()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn typed_predicate<E, P>(predicate: P) -> Predicate
where
    E: Event,
    P: Fn(&E) -> bool + Send + Sync + 'static,
{
    Arc::new(move |event: &GatewayEvent| E::from_gateway(event).is_some_and(|e| predicate(e.as_ref())))
}

fn ensure_satisfiable(
    target: impl fmt::Display,
    requirement: Requirement,
    declared: Intents,
) -> DispatchResult<()> {
    if requirement.is_satisfied_by(declared) {
        Ok(())
    } else {
        Err(DispatchError::UnsatisfiableCapability {
            target: target.to_string(),
            requirement,
            declared,
            missing: requirement.missing_from(declared),
        })
    }
}

fn report_failure(
    diagnostics: &broadcast::Sender<Diagnostic>,
    subscription: &Subscription,
    shard: ShardId,
    failure: Failure,
) {
    let cause = match failure {
        Failure::Error(error) => FailureCause::Error(Arc::new(error)),
        Failure::Panic(message) => FailureCause::Panic(message),
    };
    error!(
        subscription = %subscription.id,
        kind = %subscription.kind,
        %shard,
        %cause,
        "listener failed"
    );
    let _ = diagnostics.send(Diagnostic::ListenerFailure(ListenerFailure {
        subscription: subscription.id,
        kind: subscription.kind,
        shard,
        cause,
    }));
}

#[cfg(test)]
mod tests;
