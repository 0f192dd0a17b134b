//! Okan learning platform service.
//!
//! Serves role-gated page view models over HTTP, backed by a hosted data and auth API.

pub mod access;
pub mod api;
pub mod config;
pub mod db;
pub mod pages;
pub mod server;
pub mod session;
pub mod types;
pub mod util;

#[cfg(test)]
mod testing;
