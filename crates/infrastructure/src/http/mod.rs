pub mod client;

pub use client::{BackendClient, BackendEndpoints};
