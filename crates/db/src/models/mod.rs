//! Entity model structs.
//!
//! Each submodule contains a `FromRow` + `Serialize` struct matching the
//! database row, with sealed token columns skipped during serialization.

pub mod user_credential;

pub use user_credential::UserCredential;
