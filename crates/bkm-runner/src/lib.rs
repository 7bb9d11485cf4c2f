pub mod bootstrap;
pub mod config;
pub mod hooks;
pub mod runner;
pub mod scenario;
pub mod util;

pub use bootstrap::*;
pub use config::*;
pub use hooks::*;
pub use runner::*;
pub use util::*;
