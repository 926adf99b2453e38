use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

use crate::errors::EventError;

/// Monitoring event handed over by the pipeline. Forwarded untouched as the
/// envelope payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MonitoringEvent(Value);

impl MonitoringEvent {
    pub fn from_value(value: Value) -> Result<Self, EventError> {
        if value.is_object() {
            Ok(Self(value))
        } else {
            Err(EventError::NotAnObject)
        }
    }

    pub fn parse(raw: &str) -> Result<Self, EventError> {
        Self::from_value(serde_json::from_str(raw)?)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn entity_name(&self) -> Option<&str> {
        self.0.pointer("/entity/metadata/name")?.as_str()
    }

    pub fn check_name(&self) -> Option<&str> {
        self.0.pointer("/check/metadata/name")?.as_str()
    }
}

/// Read the whole input as one event.
pub async fn read_event<R>(reader: R) -> Result<MonitoringEvent, EventError>
where
    R: AsyncRead + Unpin,
{
    let mut raw = String::new();
    let mut reader = reader;
    reader.read_to_string(&mut raw).await?;
    MonitoringEvent::parse(&raw)
}

/// Read newline-delimited events. Blank lines are skipped; the first bad line
/// aborts the read.
pub async fn read_events<R>(reader: R) -> Result<Vec<MonitoringEvent>, EventError>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut events = Vec::new();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        events.push(MonitoringEvent::parse(&line)?);
    }
    Ok(events)
}
