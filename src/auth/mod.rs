//! Authentication and authorization.
//!
//! - [`password`]: Argon2id credential hashing
//! - [`token`]: stateless signed bearer tokens
//! - [`identity`]: bearer token to user resolution
//! - [`policy`]: the allow/deny decision for each operation

pub mod identity;
pub mod password;
pub mod policy;
pub mod token;

pub use identity::{Identity, IdentityError, IdentityResolver, Principal};
pub use password::{hash_password, verify_password};
pub use policy::{ADMIN_ONLY, Decision, DenyReason, Operation, Resource, authorize};
pub use token::{Claims, TokenError, TokenIssuer};
