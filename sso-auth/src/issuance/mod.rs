//! The server-to-server API token issuance path.

pub mod cache;
pub mod issuer;
pub mod resolver;

pub use cache::{Cache, InMemoryCache};
pub use issuer::{AccessTokenIssuer, IssuedToken, API_TOKEN_TTL_HOURS};
pub use resolver::{ClientIdResolver, CLIENT_ID_CACHE_TTL_SECONDS};
