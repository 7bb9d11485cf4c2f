pub mod backoff;
pub mod engine;
pub mod error;
pub mod flags;
pub mod ids;
pub mod model;
pub mod outcomes;
pub mod paths;
pub mod types;

pub use backoff::*;
pub use engine::*;
pub use error::*;
pub use flags::*;
pub use ids::*;
pub use model::*;
pub use outcomes::*;
pub use paths::*;
pub use types::*;
