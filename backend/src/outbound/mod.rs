//! Outbound adapters implementing domain ports.
//!
//! - **persistence**: PostgreSQL repositories using Diesel.
//! - **realtime**: in-process alert hub behind `AlertBroadcaster` and
//!   `AlertFeed`.
//!
//! Adapters translate between domain types and infrastructure
//! representations and carry no business logic.

pub mod persistence;
pub mod realtime;
