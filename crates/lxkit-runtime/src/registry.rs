//! Name-to-binding directory with reference-counted handles.
//!
//! The registry owns at most one engine binding per container name. The
//! first [`ContainerRegistry::acquire`] of a name opens it, later acquires
//! share it, and the binding is released when the last [`Container`]
//! handle is dropped. The name map is the only lock in the lifecycle
//! layer; it covers bookkeeping only, never a lifecycle operation.
//!
//! Registries are plain values: build one per engine, share it by
//! cloning, and call [`ContainerRegistry::shutdown`] to assert that
//! every handle has been returned.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lxkit_common::config::RuntimeConfig;
use lxkit_common::error::{LxkitError, Result};

use crate::container::{Binding, Container};
use crate::engine::Engine;
use crate::wait::StateWaiter;

/// One live binding and the number of handles referring to it.
struct Slot {
    binding: Arc<Binding>,
    holders: usize,
}

/// State shared by a registry and every handle it issued.
pub(crate) struct Shared {
    engine: Arc<dyn Engine>,
    config: RuntimeConfig,
    slots: Mutex<HashMap<String, Slot>>,
}

impl Shared {
    pub(crate) fn engine(&self) -> &dyn Engine {
        self.engine.as_ref()
    }

    pub(crate) const fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub(crate) const fn waiter(&self) -> StateWaiter {
        StateWaiter::new(self.config.wait)
    }

    /// Locks the name map.
    ///
    /// Every critical section leaves the map consistent before it can
    /// panic, so a poisoned lock is safe to recover.
    fn slots(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records one more handle to `binding`.
    pub(crate) fn retain(&self, binding: &Arc<Binding>) {
        let name = binding.engine().name();
        let mut slots = self.slots();
        match slots.get_mut(name) {
            Some(slot) if Arc::ptr_eq(&slot.binding, binding) => slot.holders += 1,
            _ => {
                debug_assert!(false, "retain of unregistered binding {name}");
                tracing::error!(name, "retain of unregistered binding");
            }
        }
    }

    /// Drops one handle to `binding`, releasing it when none remain.
    pub(crate) fn release(&self, binding: &Arc<Binding>) {
        let name = binding.engine().name();
        let mut slots = self.slots();
        let Some(slot) = slots
            .get_mut(name)
            .filter(|slot| Arc::ptr_eq(&slot.binding, binding))
        else {
            debug_assert!(false, "release of unregistered binding {name}");
            tracing::error!(name, "release of unregistered binding");
            return;
        };

        slot.holders -= 1;
        if slot.holders == 0 {
            // Released under the lock so a concurrent acquire of the same
            // name cannot open a second binding while this one is live.
            binding.engine().release();
            let _ = slots.remove(name);
            tracing::debug!(name, "binding released");
        }
    }
}

/// Process-local directory of container bindings.
#[derive(Clone)]
pub struct ContainerRegistry {
    shared: Arc<Shared>,
}

impl ContainerRegistry {
    /// Creates a registry over `engine`.
    pub fn new(engine: Arc<dyn Engine>, config: RuntimeConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                engine,
                config,
                slots: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Creates a registry over the engine detected on this host.
    ///
    /// # Errors
    ///
    /// Returns an error if no usable engine is installed.
    pub fn detect(config: RuntimeConfig) -> Result<Self> {
        let engine = crate::backend::detect_engine(&config)?;
        Ok(Self::new(engine, config))
    }

    /// Returns a handle to `name`, opening a binding on first use.
    ///
    /// The container does not need to exist; operations on an undefined
    /// container report [`LxkitError::NotDefined`].
    pub fn acquire(&self, name: &str) -> Container {
        let mut slots = self.shared.slots();
        let binding = if let Some(slot) = slots.get_mut(name) {
            slot.holders += 1;
            Arc::clone(&slot.binding)
        } else {
            let engine = self.shared.engine.open(name, &self.shared.config.config_path);
            let binding = Arc::new(Binding::new(engine));
            let _ = slots.insert(
                name.to_owned(),
                Slot {
                    binding: Arc::clone(&binding),
                    holders: 1,
                },
            );
            tracing::debug!(name, "binding opened");
            binding
        };
        drop(slots);
        Container::new(binding, Arc::clone(&self.shared))
    }

    /// Returns a handle to the registry. Equivalent to dropping it.
    pub fn release(&self, container: Container) {
        drop(container);
    }

    /// Names of the containers defined under the default config root.
    ///
    /// Order is whatever the engine reports.
    ///
    /// # Errors
    ///
    /// Returns an error if the config root cannot be enumerated.
    pub fn container_names(&self) -> Result<Vec<String>> {
        self.shared
            .engine
            .list_defined(&self.shared.config.config_path)
    }

    /// One handle per defined container.
    ///
    /// # Errors
    ///
    /// Returns an error if the config root cannot be enumerated.
    pub fn containers(&self) -> Result<Vec<Container>> {
        Ok(self
            .container_names()?
            .iter()
            .map(|name| self.acquire(name))
            .collect())
    }

    /// Number of live bindings.
    pub fn len(&self) -> usize {
        self.shared.slots().len()
    }

    /// Returns true if no handle is outstanding.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of outstanding handles to `name`.
    pub fn holders(&self, name: &str) -> usize {
        self.shared.slots().get(name).map_or(0, |slot| slot.holders)
    }

    /// Engine version string.
    pub fn version(&self) -> String {
        self.shared.engine.version()
    }

    /// Runtime configuration the registry was built with.
    pub fn config(&self) -> &RuntimeConfig {
        &self.shared.config
    }

    /// Tears the registry down, checking that every handle was returned.
    ///
    /// # Errors
    ///
    /// Returns an error naming the containers that still have holders.
    pub fn shutdown(self) -> Result<()> {
        let mut held: Vec<String> = self.shared.slots().keys().cloned().collect();
        if held.is_empty() {
            return Ok(());
        }
        held.sort();
        Err(LxkitError::Config {
            message: format!("containers still held at shutdown: {}", held.join(", ")),
        })
    }
}

impl fmt::Debug for ContainerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerRegistry")
            .field("config_path", &self.shared.config.config_path)
            .field("bindings", &self.len())
            .finish()
    }
}
