//! Terminal front-end for docchat.

pub mod config;
pub mod handlers;
pub mod state;
