pub mod error;
pub mod sample_store;
