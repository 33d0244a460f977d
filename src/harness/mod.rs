pub mod catalog;
pub mod config;
pub mod driver;
pub mod error;
pub mod invoker;
pub mod oracle;
