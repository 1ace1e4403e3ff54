pub mod error;
pub mod feed;
pub mod filter;
pub mod retry;
