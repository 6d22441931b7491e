mod error;
mod market;
mod data;

pub use error::InputError;
pub use market::*;
pub use data::*;

pub mod write;
pub use write::*;
