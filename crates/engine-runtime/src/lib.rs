pub mod error;
pub mod execution;
pub mod service;

#[cfg(test)]
mod tests;
