//! `http`: send a request and export the response

use async_trait::async_trait;
use reqwest::Method;
use std::path::Path;

use crate::common::config::Config;
use crate::common::paths::resolve_in;
use crate::common::{Error, Result};
use crate::engine::capability::{required_param, Capability, CapabilityContext, CapabilityOutput};
use crate::scenario::Params;

/// Default export prefix
const DEFAULT_PREFIX: &str = "response";

/// Parameter prefix for request headers (`header.Content-Type`)
const HEADER_PREFIX: &str = "header.";

pub struct HttpCapability {
    client: reqwest::Client,
    base_url: Option<String>,
}

impl HttpCapability {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.http.user_agent.clone())
            .connect_timeout(config.timeouts.http_connect())
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.http.base_url.clone(),
        })
    }

    /// Apply the configured base URL to relative URLs
    fn full_url(&self, url: &str) -> String {
        match &self.base_url {
            Some(base) if !url.contains("://") => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                url.trim_start_matches('/')
            ),
            _ => url.to_string(),
        }
    }
}

#[async_trait]
impl Capability for HttpCapability {
    fn kind(&self) -> &str {
        "http"
    }

    fn required_params(&self) -> &[&'static str] {
        &["url"]
    }

    fn validate(&self, params: &Params) -> std::result::Result<(), String> {
        if !params.contains_key("url") {
            return Err("missing required parameter 'url'".to_string());
        }
        if params.contains_key("body") && params.contains_key("body_file") {
            return Err("'body' and 'body_file' are mutually exclusive".to_string());
        }
        Ok(())
    }

    async fn invoke(
        &self,
        params: &Params,
        ctx: &CapabilityContext<'_>,
    ) -> Result<CapabilityOutput> {
        let method_name = params
            .get("method")
            .map(|m| m.trim().to_uppercase())
            .unwrap_or_else(|| "GET".to_string());
        let method = Method::from_bytes(method_name.as_bytes()).map_err(|_| {
            Error::capability(self.kind(), format!("invalid method '{}'", method_name))
        })?;
        let url = self.full_url(required_param(params, self.kind(), "url")?);
        let prefix = params.get("as").map(String::as_str).unwrap_or(DEFAULT_PREFIX);

        let mut request = self.client.request(method, &url);

        for (key, value) in params {
            if let Some(name) = key.strip_prefix(HEADER_PREFIX) {
                request = request.header(name, value);
            }
        }

        if let Some(body) = params.get("body") {
            request = request.body(body.clone());
        } else if let Some(file) = params.get("body_file") {
            let path = resolve_in(ctx.workspace, Path::new(file));
            let body = tokio::fs::read(&path).await.map_err(|e| {
                Error::capability(self.kind(), format!("cannot read '{}': {}", path.display(), e))
            })?;
            request = request.body(body);
        }

        tracing::debug!(step = ctx.step, method = %method_name, url = %url, "Sending HTTP request");

        let response = request
            .send()
            .await
            .map_err(|e| Error::capability(self.kind(), format!("{} {}: {}", method_name, url, e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::capability(self.kind(), format!("failed to read response body: {}", e))
        })?;

        Ok(
            CapabilityOutput::new(format!("{} {} -> {}", method_name, url, status.as_u16()))
                .export(format!("{}.status", prefix), status.as_u16().to_string())
                .export(format!("{}.body", prefix), body),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CancelToken;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a single canned HTTP response and return the request text
    async fn serve_once(response: &'static str) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });
        (format!("http://{}", addr), handle)
    }

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_http_exports_status_and_body() {
        let (base, server) = serve_once(
            "HTTP/1.1 201 Created\r\nContent-Length: 11\r\nConnection: close\r\n\r\n{\"id\":\"42\"}",
        )
        .await;

        let capability = HttpCapability::new(&Config::default()).unwrap();
        let cancel = CancelToken::new();
        let ctx = CapabilityContext {
            workspace: Path::new("."),
            step: 1,
            cancel: &cancel,
        };
        let url = format!("{}/users", base);
        let out = capability
            .invoke(
                &params(&[
                    ("url", url.as_str()),
                    ("method", "post"),
                    ("body", "{\"name\":\"alice\"}"),
                    ("header.X-Trace", "abc"),
                ]),
                &ctx,
            )
            .await
            .unwrap();

        assert!(out
            .exports
            .contains(&("response.status".to_string(), "201".to_string())));
        assert!(out
            .exports
            .contains(&("response.body".to_string(), "{\"id\":\"42\"}".to_string())));

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /users HTTP/1.1"));
        assert!(request.to_lowercase().contains("x-trace: abc"));
    }

    #[tokio::test]
    async fn test_http_unreachable_is_capability_error() {
        // Bind then drop to get a port with nothing listening
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let capability = HttpCapability::new(&Config::default()).unwrap();
        let cancel = CancelToken::new();
        let ctx = CapabilityContext {
            workspace: Path::new("."),
            step: 1,
            cancel: &cancel,
        };
        let url = format!("http://{}/", addr);
        let err = capability
            .invoke(&params(&[("url", url.as_str())]), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Capability { .. }));
    }

    #[test]
    fn test_base_url_applies_to_relative_urls() {
        let mut config = Config::default();
        config.http.base_url = Some("http://api.local/v1/".to_string());
        let capability = HttpCapability::new(&config).unwrap();
        assert_eq!(capability.full_url("/users"), "http://api.local/v1/users");
        assert_eq!(capability.full_url("https://other/x"), "https://other/x");
    }
}
