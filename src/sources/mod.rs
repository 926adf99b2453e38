//! Token sources
//!
//! Anything able to mint a fresh access token for the dispatcher.

use std::future::Future;

use crate::cache::token::TokenRecord;
use crate::errors::AcquireError;

pub mod client_credentials;

pub use client_credentials::ClientCredentialsAcquirer;

pub trait AcquireToken {
    /// Obtain a new token. Must not touch the token cache.
    fn acquire(&self) -> impl Future<Output = Result<TokenRecord, AcquireError>> + Send;
}
