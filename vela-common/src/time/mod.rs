mod instant;

pub use instant::*;
