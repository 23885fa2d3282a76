pub mod config;
pub mod item;
pub mod tree;

pub use config::*;
pub use item::*;
pub use tree::*;
