mod config;
mod serve;

pub use config::ConfigArgs;
pub use serve::ServeArgs;
