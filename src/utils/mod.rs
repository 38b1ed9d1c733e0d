pub mod sanitize;

pub use sanitize::{sanitize_json, sanitize_params};
