pub mod dates;
pub mod error;
pub mod logging;
pub mod normalization;
pub mod string_utils;

pub use error::*;
pub use string_utils::truncate_with_suffix;
