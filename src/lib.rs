#![deny(dead_code)]

pub mod cli;
pub mod commands;
pub mod domains;
pub mod fleet;
pub mod infrastructure;
pub mod open_apps;
pub mod shared;
