//! Buildlog Core
//!
//! Core types for following a build's log stream over a realtime channel.
//!
//! This crate contains:
//! - Domain types: log events as the server sends them and rows as they are rendered
//! - Protocol: topic naming and the channel wire message format

pub mod domain;
pub mod protocol;
