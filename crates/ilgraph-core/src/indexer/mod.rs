pub mod classify;
pub mod index;
pub mod loader;
