//! Bearer-token authentication

pub mod extractor;
pub mod jwt;

pub use extractor::{bearer_token, AuthUser};
pub use jwt::{JwtAuthenticator, JwtClaims};
