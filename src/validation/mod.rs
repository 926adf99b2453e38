pub mod validator;

pub use validator::{validate, TokenValidator, ValidationOutcome, ValidationPolicy};
