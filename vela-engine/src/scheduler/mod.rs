mod registry;
mod scheduler;
mod types;

pub use registry::*;
pub use scheduler::*;
pub use types::*;
