mod earning;
mod types;

pub use earning::*;
pub use types::*;
