pub mod ranges;
pub mod reader;
