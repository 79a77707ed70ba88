//! Core types for netquota

pub mod usage;
pub mod window;

pub use usage::*;
pub use window::*;
