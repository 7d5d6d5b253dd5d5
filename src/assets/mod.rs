// src/assets/mod.rs
mod texture_store;

pub use self::texture_store::{TextureRegistry, TextureStore, TEXTURE_EXTENSIONS};
