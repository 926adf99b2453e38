use tokio::sync::{Mutex, MutexGuard};

use crate::cache::token::{TokenRecord, TokenUse};

#[derive(Debug, Default)]
struct Slot {
    record: Option<TokenRecord>,
    last_use: Option<TokenUse>,
}

/// Single-slot token store shared by every dispatch of the process.
///
/// All access goes through one async mutex. Callers that need a
/// read-validate-refresh sequence to be atomic take [`TokenCache::lock`] and
/// keep the guard until the slot has been rewritten.
#[derive(Debug, Default)]
pub struct TokenCache {
    slot: Mutex<Slot>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self) -> TokenCacheGuard<'_> {
        TokenCacheGuard {
            slot: self.slot.lock().await,
        }
    }

    pub async fn get(&self) -> Option<TokenRecord> {
        self.lock().await.get()
    }

    /// Replace whatever the slot holds.
    pub async fn put(&self, record: TokenRecord) {
        self.lock().await.put(record)
    }

    pub async fn mark_used(&self, usage: TokenUse) {
        self.lock().await.mark_used(usage)
    }

    pub async fn last_use(&self) -> Option<TokenUse> {
        self.lock().await.last_use()
    }
}

/// Exclusive access to the cache slot.
pub struct TokenCacheGuard<'a> {
    slot: MutexGuard<'a, Slot>,
}

impl TokenCacheGuard<'_> {
    pub fn get(&self) -> Option<TokenRecord> {
        self.slot.record.clone()
    }

    pub fn put(&mut self, record: TokenRecord) {
        self.slot.record = Some(record);
    }

    pub fn mark_used(&mut self, usage: TokenUse) {
        self.slot.last_use = Some(usage);
    }

    pub fn last_use(&self) -> Option<TokenUse> {
        self.slot.last_use
    }
}
