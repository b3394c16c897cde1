//! Backend registry
//!
//! Maps rig model names to factories. The session manager looks the model
//! up when a session is opened and hands the new backend to its worker.

use std::collections::BTreeMap;
use std::sync::Arc;

use rig_protocol::{Backend, HardwareError};
use rig_sim::{SimulatedRig, SimulatedRigConfig};
use tracing::debug;

use crate::config::RigParams;
use crate::error::SessionError;

/// Model name of the built-in no-op rig
pub const NONE_MODEL: &str = "None";

/// Model name of the built-in simulated rig
pub const SIMULATED_MODEL: &str = "Simulated";

type Factory =
    Arc<dyn Fn(&RigParams) -> Result<Box<dyn Backend>, HardwareError> + Send + Sync + 'static>;

struct Entry {
    description: String,
    factory: Factory,
}

/// Known rig models and how to create their backends
pub struct BackendRegistry {
    entries: BTreeMap<String, Entry>,
}

impl BackendRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Create a registry with the built-in models
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(NONE_MODEL, "No rig, frequency is tracked locally", |_| {
            let config = SimulatedRigConfig {
                id: NONE_MODEL.to_string(),
                ..Default::default()
            };
            let (rig, _) = SimulatedRig::new(config);
            let backend: Box<dyn Backend> = Box::new(rig);
            Ok(backend)
        });
        registry.register(SIMULATED_MODEL, "Simulated poll-only rig", |params| {
            let (rig, _) = SimulatedRig::new(params.simulation.clone());
            let backend: Box<dyn Backend> = Box::new(rig);
            Ok(backend)
        });
        registry
    }

    /// Add or replace a model
    pub fn register<F>(&mut self, model: impl Into<String>, description: impl Into<String>, factory: F)
    where
        F: Fn(&RigParams) -> Result<Box<dyn Backend>, HardwareError> + Send + Sync + 'static,
    {
        let model = model.into();
        debug!("Registering rig model {}", model);
        self.entries.insert(
            model,
            Entry {
                description: description.into(),
                factory: Arc::new(factory),
            },
        );
    }

    /// Check if a model is known
    pub fn contains(&self, model: &str) -> bool {
        self.entries.contains_key(model)
    }

    /// Known model names, sorted
    pub fn models(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Description of a model
    pub fn description(&self, model: &str) -> Option<&str> {
        self.entries.get(model).map(|e| e.description.as_str())
    }

    /// Create the backend for `params.model`
    pub fn create(&self, params: &RigParams) -> Result<Box<dyn Backend>, SessionError> {
        let entry = self
            .entries
            .get(&params.model)
            .ok_or_else(|| SessionError::UnknownModel(params.model.clone()))?;
        Ok((entry.factory)(params)?)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}
