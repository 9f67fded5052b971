//! Subscription records and handles.

use std::fmt;
use std::sync::Arc;

use gust_core::EventKind;

use crate::listener::{Listener, Predicate};

/// Identity of one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub(crate) u64);

impl SubscriptionId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A registered listener for one concrete kind.
pub(crate) struct Subscription {
    pub(crate) id: SubscriptionId,
    pub(crate) kind: EventKind,
    pub(crate) predicate: Option<Predicate>,
    pub(crate) listener: Listener,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriptionId,
        kind: EventKind,
        predicate: Option<Predicate>,
        listener: Listener,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            kind,
            predicate,
            listener,
        })
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("filtered", &self.predicate.is_some())
            .field("listener", &self.listener)
            .finish()
    }
}

/// Handle returned by subscribe calls; pass it to
/// [`Dispatcher::unsubscribe`](crate::Dispatcher::unsubscribe).
///
/// A family subscription covers several kinds under one id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    pub(crate) id: SubscriptionId,
    pub(crate) kinds: Vec<EventKind>,
}

impl SubscriptionHandle {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// The concrete kinds this subscription was registered under.
    pub fn kinds(&self) -> &[EventKind] {
        &self.kinds
    }
}
