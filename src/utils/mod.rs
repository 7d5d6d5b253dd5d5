// src/utils/mod.rs
pub mod viewport;

pub use self::viewport::Camera;
