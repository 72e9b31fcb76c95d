//! Types shared between the admission backend and its clients.

pub mod constants;
pub mod dto;
pub mod types;

pub use constants::*;
pub use dto::*;
pub use types::*;
