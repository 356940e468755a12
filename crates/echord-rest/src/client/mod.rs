//! Authenticated HTTP collaborator for the dispatcher.

mod config;
mod rest_client;

pub use config::RestConfig;
pub use rest_client::{RequestOptions, RestClient};
