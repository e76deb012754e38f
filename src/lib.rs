pub mod config;
pub mod csv;
pub mod domain;
pub mod error;
pub mod pipeline;
pub mod store;
