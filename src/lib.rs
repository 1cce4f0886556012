#[macro_use]
pub mod macros;

pub mod api;
pub mod config;
pub mod credentials;
pub mod notify;
pub mod parser;
pub mod phone;
pub mod schema;
pub mod traverse;
