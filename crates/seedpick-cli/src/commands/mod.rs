pub mod config;
pub mod daemon;
pub mod history;
pub mod select;
