//! Account linking and credential lifecycle.
//!
//! [`vault`] owns ciphertext at rest, [`refresher`] keeps access tokens
//! valid, and [`linking`] drives the OAuth authorization flow end to end.

pub mod linking;
pub mod refresher;
pub mod vault;
