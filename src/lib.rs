// Public API - only expose the runner module
pub mod runner;

// Internal modules - organized by subsystem
mod config;
mod dataset;
mod formats;
mod hive;
mod io;

#[cfg(test)]
mod integ_tests;
