//! Auth domain - bearer tokens for relief accounts
//!
//! Responsibilities:
//! - Signing and verifying JWTs whose subject is a reference id
//! - Resolving a token to the caller's current role through the user directory

pub mod jwt;
pub mod provider;

pub use jwt::{Claims, JwtService};
pub use provider::JwtAuthProvider;
