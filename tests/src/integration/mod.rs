//! # Integration Tests
//!
//! Relay messages built by the simulated source chain, submitted through
//! `BmvApi` exactly as a message center would.

pub mod flows;
