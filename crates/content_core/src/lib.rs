pub mod api;
pub mod config;
pub mod db;
pub mod diagnostics;
pub mod error;
pub mod facade;
pub mod fallback;
pub mod handlers;
pub mod import;
pub mod logging;
pub mod memory;
pub mod schema;
