pub mod jwt;
pub mod validation;

pub use jwt::{Claims, JwtService};
pub use validation::*;
