use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info};

use crate::cache::token::TokenRecord;
use crate::config::handler::ClientCredentials;
use crate::errors::AcquireError;
use crate::helpers::time::get_instant;
use crate::observability::metrics::{get_metrics, OUTCOME_SUCCESS};
use crate::sources::AcquireToken;
use crate::utils::constants::GRANT_TYPE_CLIENT_CREDENTIALS;

/// Exchanges client credentials for an access token at the SSO endpoint.
///
/// One attempt per call; the caller decides what a failure means.
#[derive(Debug, Clone)]
pub struct ClientCredentialsAcquirer {
    client: Client,
    credentials: ClientCredentials,
}

impl ClientCredentialsAcquirer {
    pub fn new(credentials: ClientCredentials, timeout: Duration) -> Result<Self, AcquireError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AcquireError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, credentials))
    }

    pub fn with_client(client: Client, credentials: ClientCredentials) -> Self {
        Self {
            client,
            credentials,
        }
    }

    async fn request_token(&self) -> Result<TokenRecord, AcquireError> {
        let form = [
            ("grant_type", GRANT_TYPE_CLIENT_CREDENTIALS),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
        ];

        // .form() sets application/x-www-form-urlencoded
        let response = self
            .client
            .post(&self.credentials.sso_url)
            .form(&form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "token endpoint refused the grant");
            return Err(AcquireError::Rejected {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport_error)?;
        serde_json::from_slice::<TokenRecord>(&body)
            .map_err(|e| AcquireError::Decode(e.to_string()))
    }
}

impl AcquireToken for ClientCredentialsAcquirer {
    async fn acquire(&self) -> Result<TokenRecord, AcquireError> {
        let metrics = get_metrics().await;
        let start = get_instant();
        let result = self.request_token().await;
        let outcome = match &result {
            Ok(record) => {
                info!(
                    token_type = %record.token_type,
                    expires_at = ?record.expires_at,
                    "token acquired from sso in {:?}",
                    start.elapsed()
                );
                OUTCOME_SUCCESS
            }
            Err(AcquireError::Transport(_)) => "transport",
            Err(AcquireError::Rejected { .. }) => "rejected",
            Err(AcquireError::Decode(_)) => "decode",
        };
        metrics.token_acquisitions.with_label_values(&[outcome]).inc();
        result
    }
}

fn transport_error(err: reqwest::Error) -> AcquireError {
    if err.is_timeout() {
        AcquireError::Transport(format!("timed out: {}", err))
    } else {
        AcquireError::Transport(err.to_string())
    }
}
