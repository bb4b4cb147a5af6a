pub mod config;
pub mod ec2;
pub mod error;
pub mod server;
pub mod vdc;

pub use error::{Error, Result};
