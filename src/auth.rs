//! Token secrets, the stored access/refresh pair, and the bearer authorization model.

pub mod authorization;
pub mod pair;
pub mod secret;

pub use authorization::*;
pub use pair::*;
pub use secret::*;
