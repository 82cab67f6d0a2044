//! `sleep`: wait a number of milliseconds

use async_trait::async_trait;
use std::time::Duration;

use crate::common::{Error, Result};
use crate::engine::capability::{required_param, Capability, CapabilityContext, CapabilityOutput};
use crate::scenario::Params;

pub struct SleepCapability;

#[async_trait]
impl Capability for SleepCapability {
    fn kind(&self) -> &str {
        "sleep"
    }

    fn required_params(&self) -> &[&'static str] {
        &["ms"]
    }

    async fn invoke(
        &self,
        params: &Params,
        ctx: &CapabilityContext<'_>,
    ) -> Result<CapabilityOutput> {
        let raw = required_param(params, self.kind(), "ms")?.trim();
        let ms: u64 = raw
            .parse()
            .map_err(|_| Error::capability(self.kind(), format!("invalid duration '{}' ms", raw)))?;

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(ms)) => {}
            _ = ctx.cancel.cancelled() => return Err(Error::Cancelled),
        }

        Ok(CapabilityOutput::new(format!("slept {} ms", ms)))
    }
}
