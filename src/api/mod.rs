pub mod client;
pub mod error;
pub mod models;

pub use client::{PfSenseClient, UnboundApi};
pub use error::ApiError;
