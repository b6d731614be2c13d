//! The block-scoped state machine of the vela chain core.
//!
//! Each block runs against a [`track::Track`] overlay of the substate database. Modules are
//! stateless blueprints whose functions take a [`system::system_api::SystemApi`], which the
//! [`system::kernel::Kernel`] implements for the block in progress.

pub mod bank;
pub mod config;
pub mod earning;
pub mod engine;
pub mod errors;
pub mod messages;
pub mod noding;
pub mod referral;
pub mod scheduler;
pub mod system;
pub mod tariff;
pub mod track;
pub mod types;

/// Each module should have its own prelude, which:
/// * Adds preludes of upstream crates
/// * Exports types with specific-enough names which mean they can safely be used downstream.
pub mod prelude {
    pub use crate::bank::*;
    pub use crate::config::*;
    pub use crate::earning::*;
    pub use crate::engine::*;
    pub use crate::errors::*;
    pub use crate::messages::*;
    pub use crate::noding::*;
    pub use crate::referral::*;
    pub use crate::scheduler::*;
    pub use crate::system::events::*;
    pub use crate::system::kernel::*;
    pub use crate::system::system_api::*;
    pub use crate::tariff::*;
    pub use crate::track::*;
    pub use vela_common::prelude::*;
}
