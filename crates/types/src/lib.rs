pub mod cloud;
pub mod outcome;
pub mod task_config;
pub mod token;

pub use cloud::*;
pub use outcome::*;
pub use task_config::*;
pub use token::*;

/// Partner identifier the identity service expects when issuing session tokens
pub const PARTNER_SOURCE_ID: &str = "001003";
