//! Device web-services transport for subscriptions and alarms.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    domain::{AlarmKind, EndpointName},
    error::ApiError,
    protocol::{AlarmRequest, SubscriptionRequest},
};

use crate::{error::GatewayError, RemoteOperationGateway};

pub struct HttpGateway {
    http: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn subscription_url(&self, endpoint: &EndpointName) -> String {
        format!("{}/ws/subscriptions/{endpoint}~sub", self.base_url)
    }

    fn alarm_url(&self, endpoint: &EndpointName, kind: AlarmKind) -> String {
        format!("{}/ws/alarms/{endpoint}~{kind}", self.base_url)
    }
}

async fn ensure_accepted(res: Response) -> Result<()> {
    let status = res.status();
    if status.is_success() {
        return Ok(());
    }

    let body = res.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&body)
        .map(|err| err.message)
        .unwrap_or(body);
    Err(GatewayError::Rejected {
        status: status.as_u16(),
        message,
    }
    .into())
}

#[async_trait]
impl RemoteOperationGateway for HttpGateway {
    async fn subscribe(&self, endpoint: &EndpointName, interval_seconds: u32) -> Result<()> {
        let url = self.subscription_url(endpoint);
        let res = self
            .http
            .put(&url)
            .json(&SubscriptionRequest::new(endpoint, interval_seconds))
            .send()
            .await
            .with_context(|| format!("failed to reach device: {url}"))?;
        ensure_accepted(res).await
    }

    async fn unsubscribe(&self, endpoint: &EndpointName) -> Result<()> {
        let url = self.subscription_url(endpoint);
        let res = self
            .http
            .delete(&url)
            .send()
            .await
            .with_context(|| format!("failed to reach device: {url}"))?;
        ensure_accepted(res).await
    }

    async fn create_alarm(
        &self,
        endpoint: &EndpointName,
        kind: AlarmKind,
        retry_count: u32,
        threshold: f64,
    ) -> Result<()> {
        let url = self.alarm_url(endpoint, kind);
        let res = self
            .http
            .put(&url)
            .json(&AlarmRequest::new(endpoint, kind, retry_count, threshold))
            .send()
            .await
            .with_context(|| format!("failed to reach device: {url}"))?;
        ensure_accepted(res).await
    }

    async fn remove_alarm(&self, endpoint: &EndpointName, kind: AlarmKind) -> Result<()> {
        let url = self.alarm_url(endpoint, kind);
        let res = self
            .http
            .delete(&url)
            .send()
            .await
            .with_context(|| format!("failed to reach device: {url}"))?;
        ensure_accepted(res).await
    }
}

#[cfg(test)]
#[path = "tests/http_gateway_tests.rs"]
mod tests;
