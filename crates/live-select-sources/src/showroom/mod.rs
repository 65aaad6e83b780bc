pub mod client;

pub use client::{ShowroomClient, ONLIVES_PATH};
