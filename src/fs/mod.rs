pub mod local;
pub mod types;

pub use local::{Filesystem, LocalFs};
pub use types::*;
