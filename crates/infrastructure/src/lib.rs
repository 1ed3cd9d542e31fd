pub mod http;
pub mod repositories;

pub use http::*;
pub use repositories::*;
