//! Core types for Skiff

mod object;
mod presigned;
mod request;
mod upload;

pub use object::*;
pub use presigned::*;
pub use request::*;
pub use upload::*;
