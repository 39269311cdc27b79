pub mod cli;
pub mod commands;
pub mod discover;
pub mod utils;
pub mod writers;
