mod config;
mod global;

pub use config::*;
pub use global::*;
