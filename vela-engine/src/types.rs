pub use vela_common::prelude::*;
pub use vela_store_interface::interface::*;
