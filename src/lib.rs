pub mod api;
pub mod auth;
pub mod chain;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod scoring;
