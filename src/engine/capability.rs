//! Capability trait and registry
//!
//! Action steps are dispatched by kind string to a registered capability,
//! so new kinds can be added without touching the executor.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::scenario::Params;

use super::cancel::CancelToken;
use super::capabilities;

/// Environment handed to a capability for one invocation
pub struct CapabilityContext<'a> {
    /// Root that relative paths are resolved against
    pub workspace: &'a Path,
    /// 1-based index of the step being executed
    pub step: usize,
    /// Cancellation signal for long-running work
    pub cancel: &'a CancelToken,
}

/// What a successful invocation produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilityOutput {
    /// Human-readable summary for the report
    pub message: String,
    /// Key/value pairs written into the runtime property layer
    pub exports: Vec<(String, String)>,
}

impl CapabilityOutput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exports: Vec::new(),
        }
    }

    pub fn export(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.exports.push((key.into(), value.into()));
        self
    }
}

/// Look up a parameter an invocation cannot proceed without
pub fn required_param<'p>(params: &'p Params, kind: &str, name: &str) -> Result<&'p str> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| Error::capability(kind, format!("missing required parameter '{}'", name)))
}

/// An operation an action step can invoke
#[async_trait]
pub trait Capability: Send + Sync {
    /// Kind string used in documents
    fn kind(&self) -> &str;

    /// Parameters that must be present at load time
    fn required_params(&self) -> &[&'static str] {
        &[]
    }

    /// Check raw parameters at load time
    fn validate(&self, params: &Params) -> std::result::Result<(), String> {
        match self
            .required_params()
            .iter()
            .find(|name| !params.contains_key(**name))
        {
            Some(missing) => Err(format!("missing required parameter '{}'", missing)),
            None => Ok(()),
        }
    }

    /// Run with substituted parameters
    async fn invoke(&self, params: &Params, ctx: &CapabilityContext<'_>)
        -> Result<CapabilityOutput>;
}

/// Capabilities keyed by kind
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    capabilities: BTreeMap<String, Arc<dyn Capability>>,
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl CapabilityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in capability
    pub fn with_builtins(config: &Config) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Arc::new(capabilities::SetCapability));
        registry.register(Arc::new(capabilities::SleepCapability));
        registry.register(Arc::new(capabilities::ReadFileCapability));
        registry.register(Arc::new(capabilities::ExtractCapability));
        registry.register(Arc::new(capabilities::HttpCapability::new(config)?));
        registry.register(Arc::new(capabilities::ShellCapability::new(&config.shell)));
        Ok(registry)
    }

    /// Register a capability, returning the one it replaced
    pub fn register(&mut self, capability: Arc<dyn Capability>) -> Option<Arc<dyn Capability>> {
        self.capabilities
            .insert(capability.kind().to_string(), capability)
    }

    /// Get the capability for a kind
    pub fn get(&self, kind: &str) -> Option<Arc<dyn Capability>> {
        self.capabilities.get(kind).cloned()
    }

    /// Registered kinds in sorted order
    pub fn kinds(&self) -> Vec<&str> {
        self.capabilities.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Capability for Echo {
        fn kind(&self) -> &str {
            "echo"
        }

        fn required_params(&self) -> &[&'static str] {
            &["text"]
        }

        async fn invoke(
            &self,
            params: &Params,
            _ctx: &CapabilityContext<'_>,
        ) -> Result<CapabilityOutput> {
            Ok(CapabilityOutput::new(params["text"].clone()))
        }
    }

    #[test]
    fn test_builtin_kinds() {
        let registry = CapabilityRegistry::with_builtins(&Config::default()).unwrap();
        assert_eq!(
            registry.kinds(),
            vec!["extract", "http", "read_file", "set", "shell", "sleep"]
        );
    }

    #[test]
    fn test_register_replaces_same_kind() {
        let mut registry = CapabilityRegistry::new();
        assert!(registry.register(Arc::new(Echo)).is_none());
        assert!(registry.register(Arc::new(Echo)).is_some());
        assert_eq!(registry.kinds(), vec!["echo"]);
    }

    #[test]
    fn test_default_validate_reports_missing_parameter() {
        let params = Params::new();
        let err = Echo.validate(&params).unwrap_err();
        assert_eq!(err, "missing required parameter 'text'");
    }
}
