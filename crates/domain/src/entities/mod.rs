pub mod cache;
pub mod piece_view;
pub mod settings;

pub use cache::*;
pub use piece_view::*;
pub use settings::*;
