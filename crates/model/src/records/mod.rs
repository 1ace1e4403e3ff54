pub mod document;
pub mod outcome;
pub mod range;
