use std::time::Duration;

use http::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{info, warn};

use crate::errors::DeliveryError;
use crate::helpers::time::get_instant;
use crate::observability::metrics::{get_metrics, OUTCOME_SUCCESS};

/// Single-attempt POST of a serialized envelope to the ingestion endpoint.
#[derive(Debug, Clone)]
pub struct Delivery {
    client: Client,
    webhook_url: String,
}

impl Delivery {
    pub fn new(webhook_url: impl Into<String>, timeout: Duration) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, webhook_url))
    }

    pub fn with_client(client: Client, webhook_url: impl Into<String>) -> Self {
        Self {
            client,
            webhook_url: webhook_url.into(),
        }
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    /// Send `body`. `bearer` is attached as `Authorization: Bearer` when set.
    pub async fn deliver(&self, body: Vec<u8>, bearer: Option<&str>) -> Result<u16, DeliveryError> {
        let metrics = get_metrics().await;
        let start = get_instant();

        let mut request = self
            .client
            .post(&self.webhook_url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let result = match request.send().await {
            Ok(response) if response.status().is_success() => Ok(response.status().as_u16()),
            Ok(response) => Err(DeliveryError::Status {
                status: response.status().as_u16(),
            }),
            Err(err) => Err(DeliveryError::Transport(err.to_string())),
        };

        let outcome = match &result {
            Ok(_) => OUTCOME_SUCCESS,
            Err(DeliveryError::Status { .. }) => "status",
            Err(_) => "transport",
        };
        metrics.deliveries.with_label_values(&[outcome]).inc();
        metrics
            .delivery_duration
            .with_label_values(&[outcome])
            .observe(start.elapsed().as_secs_f64());

        match &result {
            Ok(status) => info!(status, url = %self.webhook_url, "event delivered"),
            Err(err) => warn!(url = %self.webhook_url, "event delivery failed: {}", err),
        }
        result
    }
}
