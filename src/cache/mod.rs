pub mod token;
pub mod token_cache;

pub use token::{TokenRecord, TokenUse};
pub use token_cache::{TokenCache, TokenCacheGuard};
