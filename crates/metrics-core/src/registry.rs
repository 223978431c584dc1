//! Plugin Registry
use crate::error::RegistryError;
use crate::plugin::Plugin;
use std::sync::Arc;

/// Names plugins may not take: `core` is the computation itself, `dflag.*`
/// names the tasks pushed by debug flags.
const RESERVED: &[&str] = &["core"];
const RESERVED_PREFIX: &str = "dflag.";

/// Registered plugins, iterated in registration order
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<(String, Arc<dyn Plugin>)>,
}

impl PluginRegistry {
    pub fn builder() -> PluginRegistryBuilder {
        PluginRegistryBuilder::default()
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, plugin)| plugin.clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn Plugin>)> {
        self.plugins.iter().map(|(n, p)| (n.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[derive(Default)]
pub struct PluginRegistryBuilder {
    plugins: Vec<(String, Arc<dyn Plugin>)>,
}

impl PluginRegistryBuilder {
    /// Register `plugin` under `name`, rejecting duplicates, reserved and malformed names
    pub fn register(
        self,
        name: impl Into<String>,
        plugin: impl Plugin + 'static,
    ) -> Result<Self, RegistryError> {
        self.register_arc(name, Arc::new(plugin))
    }

    pub fn register_arc(
        mut self,
        name: impl Into<String>,
        plugin: Arc<dyn Plugin>,
    ) -> Result<Self, RegistryError> {
        let name = name.into();
        validate_name(&name)?;
        if self.plugins.iter().any(|(n, _)| *n == name) {
            return Err(RegistryError::Duplicate(name));
        }
        self.plugins.push((name, plugin));
        Ok(self)
    }

    pub fn build(self) -> PluginRegistry {
        PluginRegistry {
            plugins: self.plugins,
        }
    }
}

fn validate_name(name: &str) -> Result<(), RegistryError> {
    if RESERVED.contains(&name) || name.starts_with(RESERVED_PREFIX) {
        return Err(RegistryError::Reserved(name.to_string()));
    }
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(RegistryError::InvalidName(name.to_string()))
    }
}
