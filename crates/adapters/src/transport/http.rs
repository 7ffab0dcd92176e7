// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP transport

use super::{ReportTransport, TransportError};
use async_trait::async_trait;
use courier_core::{Ack, ReportBatch};
use std::sync::Arc;
use std::time::Duration;

/// Backend location and credentials
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub base_url: String,
    pub application_code: String,
    pub timeout: Duration,
}

/// Posts report bodies to the backend with a blocking client on the blocking pool
#[derive(Clone)]
pub struct HttpTransport {
    config: Arc<HttpTransportConfig>,
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .build()
            .into();
        Self {
            config: Arc::new(config),
            agent,
        }
    }

    /// Endpoint for a batch
    pub fn url_for(&self, batch: &ReportBatch) -> String {
        let path = match batch {
            ReportBatch::Events { .. } => "user/events/custom",
            ReportBatch::Sessions { .. } => "user/events/session",
        };
        format!(
            "{}/mobile/1/appinstance/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            batch.registration_id(),
            path
        )
    }
}

#[async_trait]
impl ReportTransport for HttpTransport {
    async fn send(&self, batch: &ReportBatch) -> Result<Ack, TransportError> {
        let url = self.url_for(batch);
        let body = serde_json::to_string(&batch.body())
            .map_err(|e| TransportError::Encode(e.to_string()))?;
        let authorization = format!("App {}", self.config.application_code);
        let agent = self.agent.clone();
        let accepted = batch.len();

        let result = tokio::task::spawn_blocking(move || {
            agent
                .post(&url)
                .header("Authorization", &authorization)
                .header("Content-Type", "application/json")
                .send(body.as_str())
        })
        .await
        .map_err(|e| TransportError::Connection(e.to_string()))?;

        match result {
            Ok(_) => Ok(Ack { accepted }),
            Err(ureq::Error::StatusCode(code)) => Err(TransportError::Status(code)),
            Err(e) => Err(TransportError::Connection(e.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
