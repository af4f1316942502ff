pub mod argument;
pub mod config;
pub mod error;
pub mod function;
pub mod resolver;
