mod end_block;
mod lottery;
mod noding;
mod power;
mod queries;
mod store;
mod types;
mod vp_generator;

pub use lottery::LotteryQueue;
pub use noding::*;
pub use power::*;
pub use types::*;
pub use vp_generator::*;
