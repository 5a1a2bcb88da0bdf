//! Route handlers

pub mod events;
pub mod stream;
