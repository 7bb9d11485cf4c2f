pub mod clock;
pub mod memory;
pub mod script;
pub mod traits;

pub use clock::*;
pub use memory::*;
pub use script::*;
pub use traits::*;
