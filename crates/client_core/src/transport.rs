use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    domain::RsvpId,
    protocol::{Envelope, RegistrationRequest, StatsPayload, StatsResponse},
};
use tracing::debug;
use url::Url;

use crate::error::BackendError;

/// What the registration endpoint told us after accepting an RSVP.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationAck {
    pub rsvp_id: Option<RsvpId>,
    pub message: Option<String>,
}

/// The two collaborators the reconciler depends on.
#[async_trait]
pub trait RsvpBackend: Send + Sync {
    async fn fetch_stats(&self) -> Result<StatsPayload, BackendError>;
    async fn register(&self, request: &RegistrationRequest)
        -> Result<RegistrationAck, BackendError>;
}

/// Validated `http(s)` API root such as `http://localhost:5000/api`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiBase(Url);

impl ApiBase {
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw.trim()).with_context(|| format!("invalid api url '{raw}'"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!("api url must start with http:// or https://: {raw}"));
        }
        Ok(Self(url))
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.0.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

pub(crate) fn build_http_client(request_timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(request_timeout)
        .build()
        .context("failed to build http client")
}

pub(crate) fn envelope_error(body: &str) -> Option<String> {
    serde_json::from_str::<Envelope<serde_json::Value>>(body)
        .ok()
        .and_then(|envelope| envelope.error)
}

pub struct HttpRsvpBackend {
    http: Client,
    base: ApiBase,
    request_timeout: Duration,
}

impl HttpRsvpBackend {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: build_http_client(request_timeout)?,
            base: ApiBase::parse(base_url)?,
            request_timeout,
        })
    }

    pub fn base(&self) -> &ApiBase {
        &self.base
    }

    fn transport_error(&self, err: reqwest::Error) -> BackendError {
        if err.is_timeout() {
            BackendError::Timeout(self.request_timeout)
        } else {
            BackendError::Network(err.to_string())
        }
    }

    /// Reads the body as text so it can be echoed back in errors.
    async fn read(&self, response: Response) -> Result<(u16, String), BackendError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| self.transport_error(err))?;
        if !status.is_success() {
            return Err(BackendError::Server {
                status: status.as_u16(),
                message: envelope_error(&body).unwrap_or_else(|| format!("HTTP {status}")),
                body,
            });
        }
        Ok((status.as_u16(), body))
    }
}

#[async_trait]
impl RsvpBackend for HttpRsvpBackend {
    async fn fetch_stats(&self) -> Result<StatsPayload, BackendError> {
        let url = self.base.endpoint("stats");
        debug!(%url, "GET stats");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;
        let (status, body) = self.read(response).await?;
        let parsed: StatsResponse =
            serde_json::from_str(&body).map_err(|err| BackendError::Malformed {
                detail: err.to_string(),
                body: body.clone(),
            })?;
        parsed
            .into_payload()
            .map_err(|message| BackendError::Server {
                status,
                message,
                body,
            })
    }

    async fn register(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegistrationAck, BackendError> {
        let url = self.base.endpoint("rsvps");
        debug!(%url, dish = %request.selected_dish, guests = request.guests, "POST registration");
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;
        let (status, body) = self.read(response).await?;
        let envelope: Envelope<serde_json::Value> =
            serde_json::from_str(&body).map_err(|err| BackendError::Malformed {
                detail: err.to_string(),
                body: body.clone(),
            })?;
        if !envelope.success {
            return Err(BackendError::Server {
                status,
                message: envelope
                    .error
                    .unwrap_or_else(|| "registration was not accepted".to_string()),
                body,
            });
        }
        Ok(RegistrationAck {
            rsvp_id: envelope
                .data
                .as_ref()
                .and_then(|data| data.get("id"))
                .and_then(serde_json::Value::as_i64)
                .map(RsvpId),
            message: envelope.message,
        })
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
