pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod output;
pub mod render;
pub mod store;
pub mod summary;
pub mod xkcd;
