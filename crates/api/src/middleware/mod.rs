//! Request guards applied by individual routes.

pub mod webhook_secret;
