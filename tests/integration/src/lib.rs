//! Integration test utilities for echord
//!
//! Provides a scripted gateway server and canned payloads for end-to-end
//! tests of the gateway client and the REST client.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
