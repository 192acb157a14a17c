pub mod compute;
pub mod config;
pub mod display;
pub mod drivers;
pub mod entities;
pub mod error;
pub mod scene;
pub mod store;
