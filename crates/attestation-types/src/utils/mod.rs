//! Utility functions for identifiers and display formatting.

pub mod formatting;
pub mod identifiers;

pub use formatting::truncate_id;
pub use identifiers::{decode_fixed_ascii, encode_fixed_ascii};
