pub mod access_jwt;
pub mod bearer;
pub mod claims;
pub mod error;
pub mod factory;
pub mod jwks;
pub mod permissions;

#[cfg(test)]
pub mod test_support;

pub use access_jwt::AuthService;
pub use claims::AccessTokenClaims;
pub use error::AuthError;
pub use factory::build_auth_service;
