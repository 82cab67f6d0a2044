//! `extract`: pull a value out of JSON text into a property

use async_trait::async_trait;
use serde_json::Value;

use crate::common::{Error, Result};
use crate::engine::capability::{required_param, Capability, CapabilityContext, CapabilityOutput};
use crate::engine::json_path;
use crate::scenario::Params;

pub struct ExtractCapability;

#[async_trait]
impl Capability for ExtractCapability {
    fn kind(&self) -> &str {
        "extract"
    }

    fn required_params(&self) -> &[&'static str] {
        &["from", "path", "into"]
    }

    async fn invoke(
        &self,
        params: &Params,
        _ctx: &CapabilityContext<'_>,
    ) -> Result<CapabilityOutput> {
        let document: Value = serde_json::from_str(required_param(params, self.kind(), "from")?)
            .map_err(|e| Error::capability(self.kind(), format!("source is not valid JSON: {}", e)))?;

        // A wildcard path exports its first match
        let path = required_param(params, self.kind(), "path")?;
        let text = json_path::select(&document, path)
            .first()
            .map(|(_, value)| json_path::to_text(value))
            .ok_or_else(|| {
                Error::capability(self.kind(), format!("no value at path '{}'", path))
            })?;

        let into = required_param(params, self.kind(), "into")?;
        Ok(CapabilityOutput::new(format!("{} = {} (from '{}')", into, text, path))
            .export(into, text))
    }
}
