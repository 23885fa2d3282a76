pub mod bulk_ops;
pub mod check;
pub mod level_ops;
pub mod rollup;
