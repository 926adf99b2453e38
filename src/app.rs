use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::AsyncRead;
use tracing::{error, info};

use crate::cache::TokenCache;
use crate::config::{loader, Args, Authentication, HandlerConfig};
use crate::dispatch::{Delivery, Dispatcher, TokenResolver};
use crate::event::{self, MonitoringEvent};
use crate::keys::KeySetProvider;
use crate::observability::metrics;
use crate::sources::ClientCredentialsAcquirer;
use crate::utils::logging;
use crate::validation::TokenValidator;

/// Run the handler once. Any error is the pipeline's failure signal.
///
/// Returns the number of events delivered.
pub async fn run(args: &Args) -> Result<usize> {
    // -------------------------------
    // 1. Read arguments and settings
    // -------------------------------

    let settings = loader::load_settings(args.config.as_deref())?;
    logging::run(&settings, args.log_level);

    let config = HandlerConfig::resolve(args, settings).inspect_err(|e| error!("{}", e))?;

    // -------------------------------
    // 2. Token resolution
    //
    // keys are loaded before any event is read
    // -------------------------------

    let resolver = match &config.authentication {
        Authentication::Disabled => {
            info!("authentication disabled, events are sent without a token");
            TokenResolver::disabled()
        }
        Authentication::ClientCredentials(credentials) => {
            let keys = KeySetProvider::new(config.settings.keys.clone(), config.timeout)
                .load()
                .await
                .inspect_err(|e| error!("{}", e))
                .context("failed to load verification keys")?;
            let acquirer = ClientCredentialsAcquirer::new(credentials.clone(), config.timeout)?;
            TokenResolver::enabled(
                acquirer,
                keys,
                Arc::new(TokenCache::new()),
                TokenValidator::new(config.settings.token),
            )
        }
    };

    // -------------------------------
    // 3. Read event(s)
    // -------------------------------

    let events = read_input(args).await.inspect_err(|e| error!("{:#}", e))?;

    // -------------------------------
    // 4. Dispatch
    // -------------------------------

    let delivery = Delivery::new(config.webhook_url.as_str(), config.timeout)?;
    let dispatcher = Dispatcher::new(resolver, delivery, config.settings.envelope.clone());

    let mut delivered = 0;
    let mut outcome = Ok(());
    for event in &events {
        match dispatcher.dispatch(event).await {
            Ok(_) => delivered += 1,
            Err(e) => {
                error!("{}", e);
                outcome = Err(e);
                break;
            }
        }
    }

    // -------------------------------
    // 5. Metrics
    // -------------------------------

    if let Some(path) = config.settings.metrics.textfile.as_deref() {
        if let Err(e) = metrics::write_textfile(path).await {
            error!("{}", e);
        }
    }

    outcome?;
    info!(events = delivered, "done");
    Ok(delivered)
}

async fn read_input(args: &Args) -> Result<Vec<MonitoringEvent>> {
    match &args.event_file {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open event file {}", path.display()))?;
            read_from(file, args.stream).await
        }
        None => read_from(tokio::io::stdin(), args.stream).await,
    }
}

/// One event, or newline-delimited events when `stream` is set.
pub async fn read_from<R>(reader: R, stream: bool) -> Result<Vec<MonitoringEvent>>
where
    R: AsyncRead + Unpin,
{
    let events = if stream {
        event::read_events(reader).await?
    } else {
        vec![event::read_event(reader).await?]
    };
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn single_event_mode_reads_whole_input() {
        let raw = b"{\n  \"check\": {\"metadata\": {\"name\": \"disk\"}}\n}\n";
        let events = read_from(&raw[..], false).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].check_name(), Some("disk"));
    }

    #[tokio::test]
    async fn stream_mode_reads_every_line() {
        let raw = b"{\"id\":1}\n{\"id\":2}\n";
        assert_eq!(read_from(&raw[..], true).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn pretty_printed_event_is_not_a_stream() {
        let raw = b"{\n  \"id\": 1\n}\n";
        assert!(read_from(&raw[..], true).await.is_err());
    }
}
