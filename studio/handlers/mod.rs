pub mod models;
pub mod page;
pub mod predict;
