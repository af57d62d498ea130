//! Authentication and authorization core: signing keys, password hashing,
//! token issuance/verification, and the role hierarchy.

pub mod keys;
pub mod password;
pub mod rbac;
pub mod token;

pub use keys::KeyManager;
pub use rbac::{Identity, Role};
pub use token::TokenService;
