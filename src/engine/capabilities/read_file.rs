//! `read_file`: load a workspace file into a property

use async_trait::async_trait;
use std::path::Path;

use crate::common::paths::resolve_in;
use crate::common::{Error, Result};
use crate::engine::capability::{required_param, Capability, CapabilityContext, CapabilityOutput};
use crate::scenario::Params;

pub struct ReadFileCapability;

#[async_trait]
impl Capability for ReadFileCapability {
    fn kind(&self) -> &str {
        "read_file"
    }

    fn required_params(&self) -> &[&'static str] {
        &["path", "into"]
    }

    async fn invoke(
        &self,
        params: &Params,
        ctx: &CapabilityContext<'_>,
    ) -> Result<CapabilityOutput> {
        let relative = required_param(params, self.kind(), "path")?;
        let into = required_param(params, self.kind(), "into")?;
        let path = resolve_in(ctx.workspace, Path::new(relative));
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            Error::capability(self.kind(), format!("cannot read '{}': {}", path.display(), e))
        })?;

        Ok(CapabilityOutput::new(format!(
            "read {} bytes from {} into {}",
            content.len(),
            relative,
            into
        ))
        .export(into, content))
    }
}
