pub mod claims;
pub mod link_token;
pub mod session;

pub use link_token::{generate_link_token, validate_link_token};
pub use session::{issue_session_token, validate_session_token};
