//! Type-keyed service registry shared across module boundaries.
//!
//! Two views with distinct mutation rights:
//! - [`ServiceRegistry`] is the writable view handed to modules during the
//!   configure phase, and only then.
//! - [`ServiceProvider`] is the frozen view produced by `build()`, queryable
//!   from every later phase.
//!
//! Implementation details:
//! - Key = fully-qualified `type_name::<T>()`, which works for `T = dyn Trait`.
//! - Value = `Arc<T>` stored as `Box<dyn Any + Send + Sync>` (downcast on read).
//! - Re-registering overwrites the previous value; `Arc`s already handed out
//!   to consumers remain valid.

use parking_lot::RwLock;
use std::{any::Any, collections::HashMap, fmt, sync::Arc};

/// Stable type key for trait objects.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct TypeKey(&'static str);

impl TypeKey {
    #[inline]
    fn of<T: ?Sized + 'static>() -> Self {
        TypeKey(std::any::type_name::<T>())
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("service not registered: {0:?}")]
    NotFound(TypeKey),

    #[error("stored service does not match requested type {0:?}")]
    TypeMismatch(TypeKey),
}

type Boxed = Box<dyn Any + Send + Sync>;

/// Writable service collection. Modules insert the capabilities they provide
/// during their configure hook; the driver freezes it into a
/// [`ServiceProvider`] before the initialize pass.
pub struct ServiceRegistry {
    map: RwLock<HashMap<TypeKey, Boxed>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
        }
    }

    /// Register a service under the interface type `T`.
    /// `T` can be a trait object like `dyn audit::AuditSink`.
    pub fn register<T>(&self, service: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.map.write().insert(TypeKey::of::<T>(), Box::new(service));
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }

    /// Freeze into the read-only provider used from the build step onward.
    pub fn build(self) -> ServiceProvider {
        ServiceProvider {
            map: self.map.into_inner(),
        }
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only resolved view over everything the configure pass registered.
pub struct ServiceProvider {
    map: HashMap<TypeKey, Boxed>,
}

impl ServiceProvider {
    /// Fetch a service by interface type `T`.
    pub fn get<T>(&self) -> Result<Arc<T>, ServiceError>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        let boxed = self.map.get(&key).ok_or(ServiceError::NotFound(key))?;

        // Stored value is exactly `Arc<T>`; downcast is cheap.
        boxed
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or(ServiceError::TypeMismatch(key))
    }

    pub fn contains<T>(&self) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.map.contains_key(&TypeKey::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
