pub mod clustered;
pub mod config;
pub mod detailed;
pub mod error;
pub mod factory;
pub mod host;
pub mod models;
pub mod session;
pub mod tracker;
pub mod user_marker;
pub mod visual;
pub mod zoom;

#[cfg(test)]
mod fake;

pub use session::MapSession;
