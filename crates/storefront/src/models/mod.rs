//! Domain models for the storefront client.

pub mod session;
pub mod user;

pub use session::Session;
pub use user::User;
