//! HTTP inbound adapter exposing the field operations endpoints.

pub mod attendance;
pub mod error;
pub mod health;
pub mod locations;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;
