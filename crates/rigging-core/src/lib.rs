pub mod blueprint;
pub mod codec;
pub mod condition;
pub mod config;
pub mod dataobject;
pub mod descriptor;
pub mod error;
pub mod execution;
pub mod installation;
pub mod io;
pub mod literal;
pub mod owner;
pub mod paths;
pub mod store;
pub mod templater;
pub mod templates;
pub mod types;
pub mod validation;
pub mod values;

pub use error::{Result, RiggingError};
