// src/backend/registry.rs

//! Backend selection by name, and the input → validate → configure sequence
//! every freshly constructed backend goes through.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{info, warn};

use crate::backend::Backend;
use crate::config::{BackendConfig, SettingsFile};
use crate::errors::BackendError;
use crate::ui::UiInput;

/// Builds an unconfigured backend.
pub type BackendFactory = Box<dyn Fn() -> Box<dyn Backend> + Send + Sync>;

/// Backend type name -> factory.
#[derive(Default)]
pub struct BackendRegistry {
    factories: BTreeMap<String, BackendFactory>,
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Backend> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Construct an unconfigured backend.
    pub fn create(&self, name: &str) -> Result<Box<dyn Backend>, BackendError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| BackendError::UnknownBackend(name.to_string()))
    }

    /// Construct and fully initialise a backend.
    pub fn init(
        &self,
        name: &str,
        config: BackendConfig,
        ui: &dyn UiInput,
    ) -> Result<Box<dyn Backend>, BackendError> {
        let mut backend = self.create(name)?;
        init_backend(backend.as_mut(), config, ui)?;
        info!(backend = name, capabilities = %backend.capabilities(), "backend initialised");
        Ok(backend)
    }

    /// [`init`](Self::init) using the `[backend]` section of a settings file.
    pub fn init_from_settings(
        &self,
        settings: &SettingsFile,
        ui: &dyn UiInput,
    ) -> Result<Box<dyn Backend>, BackendError> {
        self.init(
            settings.backend_type(),
            settings.backend_config().clone(),
            ui,
        )
    }
}

/// Run `input`, `validate` and `configure` on `backend`.
///
/// Warnings are logged and do not stop configuration. If validation finds
/// any error, all of them are returned together and `configure` is not
/// called. Returns the configuration that was applied.
pub fn init_backend(
    backend: &mut dyn Backend,
    config: BackendConfig,
    ui: &dyn UiInput,
) -> Result<BackendConfig, BackendError> {
    let config = backend.input(ui, config)?;

    let diags = backend.validate(&config);
    for warning in diags.warnings.iter() {
        warn!(%warning, "backend configuration warning");
    }
    if !diags.is_configurable() {
        return Err(BackendError::Validation(diags.errors));
    }

    backend.configure(&config)?;
    Ok(config)
}
