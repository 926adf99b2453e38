pub mod handler;
pub mod loader;
pub mod settings;

pub use handler::{Args, Authentication, ClientCredentials, HandlerConfig};
pub use settings::SettingsConfig;
