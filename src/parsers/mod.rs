//! Parsers for Robot Framework documents and cursor positions

pub mod position_utils;
pub mod robot;
