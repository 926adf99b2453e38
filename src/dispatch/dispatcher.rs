use tracing::{debug, info};

use crate::config::settings::EnvelopeConfig;
use crate::dispatch::delivery::Delivery;
use crate::dispatch::envelope::CloudEvent;
use crate::dispatch::resolver::TokenResolver;
use crate::errors::DispatchError;
use crate::event::MonitoringEvent;
use crate::sources::{AcquireToken, ClientCredentialsAcquirer};

/// What happened to one dispatched event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub event_id: String,
    pub status: u16,
    pub refreshed: bool,
}

pub struct Dispatcher<A = ClientCredentialsAcquirer> {
    resolver: TokenResolver<A>,
    delivery: Delivery,
    envelope: EnvelopeConfig,
}

impl<A> Dispatcher<A> {
    pub fn new(resolver: TokenResolver<A>, delivery: Delivery, envelope: EnvelopeConfig) -> Self {
        Self {
            resolver,
            delivery,
            envelope,
        }
    }

    pub fn resolver(&self) -> &TokenResolver<A> {
        &self.resolver
    }
}

impl<A: AcquireToken + Sync> Dispatcher<A> {
    /// Wrap `event` in an envelope and deliver it once.
    ///
    /// The token is resolved twice per event; the second resolution supplies
    /// the bearer and observes whatever the first one cached.
    pub async fn dispatch(&self, event: &MonitoringEvent) -> Result<DispatchReport, DispatchError> {
        let first = self.resolver.resolve_token().await?;
        let second = self.resolver.resolve_token().await?;
        let refreshed = first.is_refreshed() || second.is_refreshed();

        let envelope = CloudEvent::new(&self.envelope, event, refreshed);
        let body = envelope.encode()?;
        debug!(
            payload = %String::from_utf8_lossy(&body),
            "sending event to {}",
            self.delivery.webhook_url()
        );

        let bearer = self
            .resolver
            .is_enabled()
            .then_some(second.access_token.as_str());
        let status = self.delivery.deliver(body, bearer).await?;

        info!(
            id = %envelope.id,
            entity = event.entity_name().unwrap_or("-"),
            check = event.check_name().unwrap_or("-"),
            refreshed,
            "event dispatched"
        );
        Ok(DispatchReport {
            event_id: envelope.id,
            status,
            refreshed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::token::TokenRecord;
    use crate::cache::token_cache::TokenCache;
    use crate::errors::{AcquireError, DeliveryError};
    use crate::tests::common::{
        build_reqwest_client, mint_token, sensu_event, shared_test_keys, unix_in,
        CountingAcquirer, EVENTS_PATH,
    };
    use crate::validation::TokenValidator;
    use httpmock::prelude::*;
    use std::sync::Arc;

    fn dispatcher(
        server: &MockServer,
        acquirer: CountingAcquirer,
        cache: Arc<TokenCache>,
    ) -> Dispatcher<CountingAcquirer> {
        Dispatcher::new(
            TokenResolver::enabled(acquirer, shared_test_keys(), cache, TokenValidator::default()),
            Delivery::with_client(build_reqwest_client(), server.url(EVENTS_PATH)),
            EnvelopeConfig::default(),
        )
    }

    #[tokio::test]
    async fn empty_cache_acquires_once_and_reports_refresh() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path(EVENTS_PATH)
                .header_exists("authorization")
                .body_includes(r#""refreshed":"yes""#);
            then.status(200);
        });
        let cache = Arc::new(TokenCache::new());
        let dispatcher = dispatcher(&server, CountingAcquirer::new(), cache.clone());

        let report = dispatcher.dispatch(&sensu_event()).await.unwrap();

        assert!(report.refreshed);
        assert_eq!(report.status, 200);
        assert_eq!(dispatcher.resolver().acquirer().unwrap().calls(), 1);
        mock.assert();
    }

    #[tokio::test]
    async fn warm_cache_is_not_refreshed() {
        let server = MockServer::start();
        let cached = mint_token(unix_in(3600));
        let expected_auth = format!("Bearer {}", cached);
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path(EVENTS_PATH)
                .header("authorization", expected_auth.as_str())
                .body_includes(r#""refreshed":"no""#);
            then.status(200);
        });
        let cache = Arc::new(TokenCache::new());
        cache.put(TokenRecord::new(cached)).await;
        let dispatcher = dispatcher(&server, CountingAcquirer::new(), cache);

        let report = dispatcher.dispatch(&sensu_event()).await.unwrap();

        assert!(!report.refreshed);
        assert_eq!(dispatcher.resolver().acquirer().unwrap().calls(), 0);
        mock.assert();
    }

    #[tokio::test]
    async fn acquisition_failure_skips_delivery() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path(EVENTS_PATH);
            then.status(200);
        });
        let dispatcher = dispatcher(
            &server,
            CountingAcquirer::rejecting(403),
            Arc::new(TokenCache::new()),
        );

        let err = dispatcher.dispatch(&sensu_event()).await.unwrap_err();

        assert!(matches!(
            err,
            DispatchError::Token(AcquireError::Rejected { status: 403 })
        ));
        assert!(err.to_string().starts_with("failed to get token from sso"));
        mock.assert_calls(0);
    }

    #[tokio::test]
    async fn delivery_status_is_propagated() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path(EVENTS_PATH);
            then.status(503);
        });
        let dispatcher = dispatcher(&server, CountingAcquirer::new(), Arc::new(TokenCache::new()));

        let err = dispatcher.dispatch(&sensu_event()).await.unwrap_err();

        assert!(matches!(
            err,
            DispatchError::Delivery(DeliveryError::Status { status: 503 })
        ));
        mock.assert_calls(1);
    }
}
