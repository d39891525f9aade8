//! Type-keyed adapter registry.
//!
//! The registry maps a logical type to exactly one adapter. Registration is
//! expected to happen once at startup; lookups afterwards are pure.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::error::{AdapterError, AdapterResult};
use crate::primitive::{
    BoolAdapter, BytesAdapter, DoubleAdapter, I32Adapter, IntAdapter, IntListAdapter,
    StringAdapter, StringListAdapter, U32Adapter,
};
use crate::time::{DateTimeAdapter, DurationAdapter};
use crate::traits::Adapter;

struct Registration {
    adapter_type: TypeId,
    adapter_name: &'static str,
    /// Always an `Arc<dyn Adapter<T>>` for the type this entry is keyed by.
    adapter: Box<dyn Any + Send + Sync>,
}

/// Registry of one adapter per logical type.
#[derive(Default)]
pub struct AdapterRegistry {
    entries: HashMap<TypeId, Registration>,
}

impl AdapterRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in adapter registered.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.insert_builtin::<String, _>(StringAdapter);
        registry.insert_builtin::<i64, _>(IntAdapter);
        registry.insert_builtin::<i32, _>(I32Adapter);
        registry.insert_builtin::<u32, _>(U32Adapter);
        registry.insert_builtin::<bool, _>(BoolAdapter);
        registry.insert_builtin::<f64, _>(DoubleAdapter);
        registry.insert_builtin::<Vec<u8>, _>(BytesAdapter);
        registry.insert_builtin::<Vec<String>, _>(StringListAdapter);
        registry.insert_builtin::<Vec<i64>, _>(IntListAdapter);
        registry.insert_builtin::<DateTime<Utc>, _>(DateTimeAdapter);
        registry.insert_builtin::<Duration, _>(DurationAdapter);
        registry
    }

    /// Process-wide registry of the built-in adapters.
    ///
    /// Immutable once built; custom types go through a registry of their own
    /// or an explicit adapter.
    pub fn builtins() -> &'static AdapterRegistry {
        static BUILTINS: OnceLock<AdapterRegistry> = OnceLock::new();
        BUILTINS.get_or_init(Self::with_builtins)
    }

    fn insert_builtin<T: 'static, A: Adapter<T>>(&mut self, adapter: A) {
        self.entries.insert(TypeId::of::<T>(), Self::registration(adapter));
    }

    fn registration<T: 'static, A: Adapter<T>>(adapter: A) -> Registration {
        let shared: Arc<dyn Adapter<T>> = Arc::new(adapter);
        Registration {
            adapter_type: TypeId::of::<A>(),
            adapter_name: type_name::<A>(),
            adapter: Box::new(shared),
        }
    }

    /// Register `adapter` as the adapter for `T`.
    ///
    /// Registering the same adapter type again is a no-op. Registering a
    /// different adapter type for a `T` that already has one fails with
    /// [`AdapterError::Conflict`].
    pub fn register<T: 'static, A: Adapter<T>>(&mut self, adapter: A) -> AdapterResult<()> {
        let key = TypeId::of::<T>();
        if let Some(existing) = self.entries.get(&key) {
            if existing.adapter_type == TypeId::of::<A>() {
                return Ok(());
            }
            return Err(AdapterError::Conflict {
                type_name: type_name::<T>(),
                existing: existing.adapter_name,
                requested: type_name::<A>(),
            });
        }
        debug!(
            type_name = type_name::<T>(),
            adapter = type_name::<A>(),
            "adapter registered"
        );
        self.entries.insert(key, Self::registration(adapter));
        Ok(())
    }

    /// Look up the adapter registered for `T`.
    pub fn lookup<T: 'static>(&self) -> AdapterResult<Arc<dyn Adapter<T>>> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.adapter.downcast_ref::<Arc<dyn Adapter<T>>>())
            .cloned()
            .ok_or(AdapterError::NotRegistered {
                type_name: type_name::<T>(),
            })
    }

    /// Returns `true` if `T` has a registered adapter.
    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.entries.values().map(|e| e.adapter_name).collect();
        names.sort_unstable();
        f.debug_struct("AdapterRegistry")
            .field("adapters", &names)
            .finish()
    }
}
