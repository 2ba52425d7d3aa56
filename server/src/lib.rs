pub extern crate actix_web;

pub mod config;
pub mod connection;
mod connection_tx_storage;
mod limiter;
pub mod server;
