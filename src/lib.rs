pub mod browser;
pub mod core;
pub mod export;
pub mod extract;
pub mod portal;

// --- Primary core exports ---
pub use self::core::config;
pub use self::core::types;
pub use self::core::types::*;
