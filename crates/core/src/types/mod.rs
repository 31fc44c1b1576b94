//! Core types for Autohaus.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod activity;
pub mod catalog;
pub mod id;
pub mod price;

pub use activity::ActivityAction;
pub use catalog::{Availability, CarType, CarTypeParseError};
pub use id::*;
pub use price::{Price, PriceError};
