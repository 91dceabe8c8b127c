//! SIRI stop monitoring client.
//!
//! Talks to public-transport data suppliers over SIRI's SOAP/XML
//! interface: checks that a supplier is up, fetches real-time visits at a
//! stop point and subscribes to stop monitoring updates.

pub mod config;
pub mod domain;
pub mod siri;
