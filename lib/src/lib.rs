#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod config;
pub mod context;
pub mod errors;
pub mod inference;
pub mod insights;
pub mod model;
pub mod prune;
pub mod routes;
mod server;
mod shutdown;

#[cfg(test)]
mod test_helpers;

pub use config::Config;
pub use context::AppContext;
pub use model::{build_classifier, Architecture, ResNetClassifier};
pub use server::start;
