//! # Sensu RHOSE Handler Library
//!
//! Wraps Sensu monitoring events into CloudEvents and delivers them to an
//! ingestion webhook, authenticating with a client-credentials token that is
//! cached, validated against a JWK set and refreshed when it stops being valid.
//!
//! Modules:
//! - `config` — command line, environment and settings file
//! - `keys` — verification key set and where it is loaded from
//! - `cache` — single-slot token cache
//! - `validation` — signature and expiry checks on cached tokens
//! - `sources` — token acquisition from the identity provider
//! - `dispatch` — token resolution, envelope and delivery
//! - `app` — one handler run, from arguments to exit status

pub mod app;
pub mod cache;
pub mod config;
pub mod dispatch;
pub mod errors;
pub mod event;
pub mod helpers;
pub mod keys;
pub mod observability;
pub mod sources;
pub mod utils;
pub mod validation;

#[cfg(test)]
pub mod tests;

pub use crate::dispatch::{Dispatcher, TokenResolver};
pub use crate::errors::DispatchError;
