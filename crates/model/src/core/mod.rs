pub mod identifiers;
pub mod watermark;
