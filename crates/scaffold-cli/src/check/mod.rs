//! External checker integration.

pub mod parse;
pub mod validator;

pub use parse::parse_checker_output;
pub use validator::CommandValidator;
