//! Core library components.
//!
//! This module contains the resolution logic, the caching client and the
//! store abstractions it sits on.

pub mod cache;
pub mod config;
pub mod constants;
pub mod resolver;
pub mod source;
