//! `set`: export every parameter as a property

use async_trait::async_trait;

use crate::common::Result;
use crate::engine::capability::{Capability, CapabilityContext, CapabilityOutput};
use crate::scenario::Params;

pub struct SetCapability;

#[async_trait]
impl Capability for SetCapability {
    fn kind(&self) -> &str {
        "set"
    }

    fn validate(&self, params: &Params) -> std::result::Result<(), String> {
        if params.is_empty() {
            return Err("at least one 'name: value' parameter is required".to_string());
        }
        Ok(())
    }

    async fn invoke(
        &self,
        params: &Params,
        _ctx: &CapabilityContext<'_>,
    ) -> Result<CapabilityOutput> {
        let names: Vec<&str> = params.keys().map(String::as_str).collect();
        let mut output = CapabilityOutput::new(format!("set {}", names.join(", ")));
        for (key, value) in params {
            output = output.export(key.clone(), value.clone());
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CancelToken;
    use std::path::Path;

    #[tokio::test]
    async fn test_set_exports_all_params() {
        let mut params = Params::new();
        params.insert("x".to_string(), "5".to_string());
        params.insert("name".to_string(), "alice".to_string());

        let cancel = CancelToken::new();
        let ctx = CapabilityContext {
            workspace: Path::new("."),
            step: 1,
            cancel: &cancel,
        };
        let output = SetCapability.invoke(&params, &ctx).await.unwrap();
        assert_eq!(output.message, "set name, x");
        assert_eq!(
            output.exports,
            vec![
                ("name".to_string(), "alice".to_string()),
                ("x".to_string(), "5".to_string())
            ]
        );
    }

    #[test]
    fn test_set_requires_a_parameter() {
        assert!(SetCapability.validate(&Params::new()).is_err());
    }
}
