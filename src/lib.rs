pub mod config;
pub mod errors;
pub mod output;
pub mod photos;
pub mod records;
pub mod stats;
pub mod store;
