//! Tax classification and mixed-line splitting

pub mod classifier;
pub mod split;

pub use classifier::*;
pub use split::*;
