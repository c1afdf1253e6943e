//! HTTP API Module

mod http;

pub use http::{AppState, CommandResponse, HttpServer};
