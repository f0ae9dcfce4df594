//! Middleware layers.

pub mod request_id;
