#![forbid(unsafe_code)]

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod context;
pub mod coordinate;
pub mod defaults;
pub mod error;
pub mod formats;
pub mod loader;
pub mod logging;
pub mod nav;
pub mod render;
pub mod search;
pub mod server;
pub mod slug;
pub mod store;
pub mod structure;
pub mod toc;
