// Re-export all model types
pub use self::cart::*;
pub use self::catalog::*;
pub use self::errors::*;
pub use self::response::*;
pub use self::validation::*;

pub(crate) mod cart;
mod catalog;
mod errors;
mod response;
mod validation;
