//! Core domain types
//!
//! These types are shared between the subscription engine (which receives
//! and renders events) and any surface that displays them.

pub mod event;
pub mod row;
