pub mod criteria;
pub mod engine;
pub mod types;
