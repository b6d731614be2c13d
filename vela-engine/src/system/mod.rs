pub mod events;
pub mod kernel;
pub mod system_api;
