pub mod cli;
pub mod gantt;
pub mod model;
pub mod ops;
pub mod repo;
pub mod session;
pub mod tui;
pub mod util;
