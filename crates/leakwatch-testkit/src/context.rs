//! Leak-tracking context decorator
//!
//! [`TrackingContext`] wraps a host-supplied context and records every
//! receiver, service and component-callback registration in the matching
//! category tracker before delegating the call. All platform behaviour stays
//! with the host.
//!
//! ```rust,ignore
//! let mut scope = LeakScope::new();
//! let context = TrackingContext::from_scope(host, &scope);
//!
//! context.register_receiver(&receiver, &filter);
//! context.unregister_receiver(&receiver);
//!
//! scope.verify_all()?;
//! ```

use leakwatch_core::{LeakScope, ListenerIdentity, Tracker, COMPONENT, RECEIVER, SERVICE};
use std::any::Any;
use std::sync::Arc;

/// Listener categories intercepted by [`TrackingContext`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    /// Broadcast receivers
    Receiver,
    /// Bound service connections
    Service,
    /// Component callbacks
    Component,
}

impl ListenerKind {
    /// All kinds, in tracker creation order
    pub const ALL: [ListenerKind; 3] = [Self::Receiver, Self::Service, Self::Component];

    /// Tracker category name for this kind
    pub fn category(self) -> &'static str {
        match self {
            Self::Receiver => RECEIVER,
            Self::Service => SERVICE,
            Self::Component => COMPONENT,
        }
    }
}

/// Registration surface of a host context.
///
/// Only the calls whose lifecycle is tracked are modelled; the associated
/// types stand in for the host's own receiver, filter and intent types.
pub trait HostContext {
    /// Broadcast receiver
    type Receiver: Any + Send + Sync;
    /// Filter (and any permission/handler/user arguments) for a receiver
    type Filter;
    /// Sticky broadcast returned by receiver registration
    type Intent;
    /// Service binding request
    type ServiceRequest;
    /// Service connection callback
    type Connection: Any + Send + Sync;
    /// Component callbacks
    type Callbacks: Any + Send + Sync;

    /// Register a broadcast receiver
    fn register_receiver(
        &self,
        receiver: &Arc<Self::Receiver>,
        filter: &Self::Filter,
    ) -> Option<Self::Intent>;

    /// Unregister a broadcast receiver
    fn unregister_receiver(&self, receiver: &Arc<Self::Receiver>);

    /// Bind to a service, returning whether the binding was accepted
    fn bind_service(
        &self,
        request: &Self::ServiceRequest,
        connection: &Arc<Self::Connection>,
        flags: u32,
    ) -> bool;

    /// Unbind a service connection
    fn unbind_service(&self, connection: &Arc<Self::Connection>);

    /// Register component callbacks
    fn register_component_callbacks(&self, callbacks: &Arc<Self::Callbacks>);

    /// Unregister component callbacks
    fn unregister_component_callbacks(&self, callbacks: &Arc<Self::Callbacks>);
}

/// Host context decorator that records listener registrations.
///
/// A category without a tracker is delegated untracked.
#[derive(Debug)]
pub struct TrackingContext<C> {
    base: C,
    receivers: Option<Tracker>,
    services: Option<Tracker>,
    components: Option<Tracker>,
}

impl<C: HostContext> TrackingContext<C> {
    /// Track all three categories using the scope's trackers
    pub fn from_scope(base: C, scope: &LeakScope) -> Self {
        Self {
            base,
            receivers: Some(scope.tracker(RECEIVER)),
            services: Some(scope.tracker(SERVICE)),
            components: Some(scope.tracker(COMPONENT)),
        }
    }

    /// Track only the categories given a tracker
    pub fn with_trackers(
        base: C,
        receivers: Option<Tracker>,
        services: Option<Tracker>,
        components: Option<Tracker>,
    ) -> Self {
        Self {
            base,
            receivers,
            services,
            components,
        }
    }

    /// Wrapped host context
    pub fn base(&self) -> &C {
        &self.base
    }

    /// Unwrap the host context
    pub fn into_base(self) -> C {
        self.base
    }

    /// Tracker for `kind`, if tracking is enabled for it
    pub fn tracker(&self, kind: ListenerKind) -> Option<&Tracker> {
        match kind {
            ListenerKind::Receiver => self.receivers.as_ref(),
            ListenerKind::Service => self.services.as_ref(),
            ListenerKind::Component => self.components.as_ref(),
        }
    }

    #[track_caller]
    fn record<L: Any + Send + Sync>(&self, kind: ListenerKind, listener: &Arc<L>) {
        match self.tracker(kind) {
            Some(tracker) => tracker.add(ListenerIdentity::of_arc(listener)),
            None => tracing::trace!(category = kind.category(), "registration not tracked"),
        }
    }

    fn release<L: Any + Send + Sync>(&self, kind: ListenerKind, listener: &Arc<L>) {
        if let Some(tracker) = self.tracker(kind) {
            tracker.clear(&ListenerIdentity::of_arc(listener));
        }
    }
}

impl<C: HostContext> HostContext for TrackingContext<C> {
    type Receiver = C::Receiver;
    type Filter = C::Filter;
    type Intent = C::Intent;
    type ServiceRequest = C::ServiceRequest;
    type Connection = C::Connection;
    type Callbacks = C::Callbacks;

    #[track_caller]
    fn register_receiver(
        &self,
        receiver: &Arc<Self::Receiver>,
        filter: &Self::Filter,
    ) -> Option<Self::Intent> {
        self.record(ListenerKind::Receiver, receiver);
        self.base.register_receiver(receiver, filter)
    }

    fn unregister_receiver(&self, receiver: &Arc<Self::Receiver>) {
        self.release(ListenerKind::Receiver, receiver);
        self.base.unregister_receiver(receiver);
    }

    #[track_caller]
    fn bind_service(
        &self,
        request: &Self::ServiceRequest,
        connection: &Arc<Self::Connection>,
        flags: u32,
    ) -> bool {
        self.record(ListenerKind::Service, connection);
        self.base.bind_service(request, connection, flags)
    }

    fn unbind_service(&self, connection: &Arc<Self::Connection>) {
        self.release(ListenerKind::Service, connection);
        self.base.unbind_service(connection);
    }

    #[track_caller]
    fn register_component_callbacks(&self, callbacks: &Arc<Self::Callbacks>) {
        self.record(ListenerKind::Component, callbacks);
        self.base.register_component_callbacks(callbacks);
    }

    fn unregister_component_callbacks(&self, callbacks: &Arc<Self::Callbacks>) {
        self.release(ListenerKind::Component, callbacks);
        self.base.unregister_component_callbacks(callbacks);
    }
}
