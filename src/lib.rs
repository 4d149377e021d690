pub mod config;
pub mod console;
pub mod controller;
pub mod dto;
pub mod errors;
pub mod models;
pub mod services;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;
