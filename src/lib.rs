// lib.rs

pub mod app;
pub mod config;
pub mod due;
pub mod error;
pub mod item;
pub mod list;
pub mod logging;
pub mod pagination;
pub mod query;
pub mod remote;
pub mod store;
pub mod tui;
pub mod worker;
