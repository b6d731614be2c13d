//! Shared value types of the vela chain core.

pub mod address;
pub mod codec;
pub mod constants;
pub mod crypto;
pub mod math;
pub mod time;

/// Each module should have its own prelude, which:
/// * Adds preludes of upstream crates
/// * Exports types with specific-enough names which mean they can safely be used downstream.
pub mod prelude {
    pub use crate::address::*;
    pub use crate::codec::*;
    pub use crate::constants::*;
    pub use crate::crypto::*;
    pub use crate::math::*;
    pub use crate::time::*;
}
