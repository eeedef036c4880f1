//! HTTP request handlers.

pub mod oauth;
pub mod webhook;
