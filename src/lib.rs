pub mod app;
pub mod cli;
pub mod config;
pub mod debounce;
pub mod filter;
pub mod loader;
pub mod logging;
pub mod model;
pub mod output;
pub mod resolver;
pub mod runner;
pub mod utils;

#[cfg(test)]
mod tests;
