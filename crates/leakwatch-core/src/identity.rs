//! Listener identity
//!
//! Listeners are tracked by reference identity: the address of the registered
//! object. Two listeners with identical state are still two keys.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Reference identity of a registered listener.
///
/// Equality and hashing consider only the listener's address. The type name
/// is carried for leak reports.
#[derive(Clone)]
pub struct ListenerIdentity {
    addr: usize,
    type_name: &'static str,
    // Keeps the listener alive while tracked so its address is not reused.
    retained: Option<Arc<dyn Any + Send + Sync>>,
}

impl ListenerIdentity {
    /// Identity of a shared listener.
    ///
    /// The identity holds a clone of the `Arc`, so the listener cannot be
    /// freed (and its address handed to another listener) while any record
    /// for it is outstanding.
    pub fn of_arc<T: Any + Send + Sync>(listener: &Arc<T>) -> Self {
        let retained: Arc<dyn Any + Send + Sync> = listener.clone();
        Self {
            addr: Arc::as_ptr(listener).cast::<()>() as usize,
            type_name: std::any::type_name::<T>(),
            retained: Some(retained),
        }
    }

    /// Identity of a borrowed listener.
    ///
    /// Nothing is retained: the caller keeps the listener alive between
    /// registration and unregistration. Zero-sized values have no distinct
    /// address and should be registered through [`ListenerIdentity::of_arc`].
    /// A value and its first field can share an address too, so
    /// `of_ref(&outer)` and `of_ref(&outer.first)` may be the same identity.
    pub fn of_ref<T: ?Sized>(listener: &T) -> Self {
        Self {
            addr: (listener as *const T).cast::<()>() as usize,
            type_name: std::any::type_name::<T>(),
            retained: None,
        }
    }

    /// Address the identity is keyed on
    pub fn addr(&self) -> usize {
        self.addr
    }

    /// Type name of the listener
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether this identity keeps its listener alive
    pub fn is_retained(&self) -> bool {
        self.retained.is_some()
    }
}

impl PartialEq for ListenerIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

impl Eq for ListenerIdentity {}

impl Hash for ListenerIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr.hash(state);
    }
}

impl fmt::Debug for ListenerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerIdentity")
            .field("addr", &format_args!("{:#x}", self.addr))
            .field("type_name", &self.type_name)
            .finish()
    }
}

impl fmt::Display for ListenerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:#x}", self.type_name, self.addr)
    }
}
