pub mod continuation;
pub mod page;
pub mod paginator;
