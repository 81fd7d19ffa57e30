use std::path::{Path, PathBuf};
use std::sync::Arc;

use infra_backend::config::BackendConfig;
use infra_backend::module::ModuleTree;
use infra_backend::operation::ResourceAddress;
use infra_backend::plan::Plan;

/// In-memory module tree declaring a fixed list of resources.
#[derive(Debug, Clone)]
pub struct FakeModule {
    dir: PathBuf,
    loaded: bool,
    resources: Vec<ResourceAddress>,
}

impl FakeModule {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            loaded: true,
            resources: Vec::new(),
        }
    }

    /// Add a declared resource. Panics on an invalid address.
    pub fn resource(mut self, address: &str) -> Self {
        self.resources
            .push(ResourceAddress::parse(address).expect("valid resource address"));
        self
    }

    /// Mark the tree as missing child modules.
    pub fn unloaded(mut self) -> Self {
        self.loaded = false;
        self
    }

    pub fn build(self) -> Arc<dyn ModuleTree> {
        Arc::new(self)
    }
}

impl ModuleTree for FakeModule {
    fn source_dir(&self) -> &Path {
        &self.dir
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn resources(&self) -> Vec<ResourceAddress> {
        self.resources.clone()
    }
}

/// Plan with a fixed emptiness, optionally carrying its module.
#[derive(Debug, Clone)]
pub struct FakePlan {
    pub empty: bool,
    pub module: Option<Arc<dyn ModuleTree>>,
}

impl FakePlan {
    pub fn new(empty: bool) -> Self {
        Self {
            empty,
            module: None,
        }
    }

    pub fn with_module(mut self, module: Arc<dyn ModuleTree>) -> Self {
        self.module = Some(module);
        self
    }

    pub fn build(self) -> Arc<dyn Plan> {
        Arc::new(self)
    }
}

impl Plan for FakePlan {
    fn is_empty(&self) -> bool {
        self.empty
    }

    fn module(&self) -> Option<Arc<dyn ModuleTree>> {
        self.module.clone()
    }
}

/// A config accepted by [`FakeBackend`](crate::fake_backend::FakeBackend).
pub fn fake_config(lineage: &str) -> BackendConfig {
    BackendConfig::new().with("lineage", lineage)
}

/// Standard two-resource module used across tests.
pub fn web_module() -> Arc<dyn ModuleTree> {
    FakeModule::new("infra/web")
        .resource("aws_instance.web")
        .resource("aws_security_group.web")
        .build()
}
