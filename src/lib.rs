pub mod config;
pub mod db;
pub mod dto;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
mod test_support;
