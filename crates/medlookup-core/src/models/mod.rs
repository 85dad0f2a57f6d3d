//! Domain models for medicine queries.

mod intent;
mod medicine;
mod resolution;
mod response;

pub use intent::*;
pub use medicine::*;
pub use resolution::*;
pub use response::*;
