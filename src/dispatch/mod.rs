pub mod delivery;
pub mod dispatcher;
pub mod envelope;
pub mod resolver;

pub use delivery::Delivery;
pub use dispatcher::{DispatchReport, Dispatcher};
pub use envelope::CloudEvent;
pub use resolver::{ResolvedToken, TokenResolver};
