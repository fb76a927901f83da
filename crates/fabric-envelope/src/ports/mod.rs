//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! - **Inbound (Driving)**: messaging API offered to applications
//! - **Outbound (Driven)**: transport and metrics this crate depends on

pub mod inbound;
pub mod outbound;
