pub mod executor;
pub mod request;
pub mod workers;
