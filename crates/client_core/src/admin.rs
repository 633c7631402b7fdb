use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use shared::{
    domain::RsvpId,
    protocol::{DishStatus, Envelope, RsvpRecord, StatsPayload, StatsResponse},
};
use tracing::debug;

use crate::transport::{build_http_client, envelope_error, ApiBase};

/// Organizer-side calls against the same API the reconciler polls.
pub struct AdminClient {
    http: Client,
    base: ApiBase,
}

impl AdminClient {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: build_http_client(request_timeout)?,
            base: ApiBase::parse(base_url)?,
        })
    }

    async fn call(&self, method: Method, path: &str) -> Result<String> {
        let url = self.base.endpoint(path);
        debug!(%method, %url, "admin request");
        let response = self
            .http
            .request(method, &url)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;
        let status = response.status();
        let body = response.text().await.context("failed to read response body")?;
        if !status.is_success() {
            let reason = envelope_error(&body).unwrap_or_else(|| body.clone());
            return Err(anyhow!("{url} answered HTTP {status}: {reason}"));
        }
        Ok(body)
    }

    async fn data<T: DeserializeOwned>(&self, method: Method, path: &str) -> Result<T> {
        let body = self.call(method, path).await?;
        let envelope: Envelope<T> =
            serde_json::from_str(&body).with_context(|| format!("unexpected response: {body}"))?;
        if !envelope.success {
            return Err(anyhow!(envelope
                .error
                .unwrap_or_else(|| "request was not accepted".to_string())));
        }
        envelope
            .data
            .ok_or_else(|| anyhow!("response carried no data: {body}"))
    }

    pub async fn list_rsvps(&self) -> Result<Vec<RsvpRecord>> {
        self.data(Method::GET, "rsvps").await
    }

    pub async fn dish_statuses(&self) -> Result<Vec<DishStatus>> {
        self.data(Method::GET, "dishes").await
    }

    pub async fn stats(&self) -> Result<StatsPayload> {
        let body = self.call(Method::GET, "stats").await?;
        let parsed: StatsResponse =
            serde_json::from_str(&body).with_context(|| format!("unexpected response: {body}"))?;
        parsed.into_payload().map_err(|reason| anyhow!(reason))
    }

    pub async fn accept(&self, id: RsvpId) -> Result<RsvpRecord> {
        self.data(Method::POST, &format!("rsvps/{id}/accept")).await
    }

    pub async fn reject(&self, id: RsvpId) -> Result<RsvpRecord> {
        self.data(Method::POST, &format!("rsvps/{id}/reject")).await
    }

    pub async fn delete(&self, id: RsvpId) -> Result<()> {
        self.call(Method::DELETE, &format!("rsvps/{id}")).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/admin_tests.rs"]
mod tests;
