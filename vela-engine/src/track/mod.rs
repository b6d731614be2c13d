mod track;
mod utils;


pub use track::*;
pub use utils::OverlayingIterator;
