//! Bearer-token authentication

pub mod extractor;
pub mod jwt;

pub use extractor::AuthUser;
pub use jwt::{JwtClaims, JwtValidator};
