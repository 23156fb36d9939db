//! Request-scoped values keyed by type.
//!
//! Middleware attaches values here (the [`SessionLayer`](crate::SessionLayer)
//! stores the request's [`Session`](crate::Session)) and handlers read them
//! back by type.

use std::any::{Any, TypeId};
use std::collections::HashMap;

/// A type map for storing request-scoped data
///
/// ```rust,ignore
/// #[derive(Clone)]
/// struct CurrentUser(String);
///
/// // in middleware
/// req.extensions_mut().insert(CurrentUser("grey".into()));
///
/// // in a handler
/// let user = req.extensions().get::<CurrentUser>();
/// ```
#[derive(Default)]
pub struct Extensions {
    map: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Extensions {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value`, returning the previous value of the same type.
    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.map
            .insert(TypeId::of::<T>(), Box::new(value))
            .and_then(|boxed| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// Borrow the stored value of type `T`.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.map
            .get(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast_ref::<T>())
    }

    /// Take the stored value of type `T` out of the map.
    pub fn remove<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.map
            .remove(&TypeId::of::<T>())
            .and_then(|boxed| boxed.downcast::<T>().ok())
            .map(|boxed| *boxed)
    }

    /// Whether a value of type `T` is stored.
    pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
        self.map.contains_key(&TypeId::of::<T>())
    }
}

impl std::fmt::Debug for Extensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extensions")
            .field("count", &self.map.len())
            .finish()
    }
}
