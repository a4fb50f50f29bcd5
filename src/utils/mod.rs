pub mod error;
pub mod lenient_json;
pub mod logger;
pub mod retention;
pub mod validation;
