pub mod animation;
pub mod app;
pub mod config;
pub mod error;
pub mod fs_utils;
pub mod gesture;
pub mod image_utils;
pub mod layout;
pub mod viewer;
