//! GPU backend abstraction layer

pub mod headless;
pub mod traits;
pub mod types;

pub use headless::{Command, HeadlessBackend, RecordedParam};
pub use traits::*;
pub use types::*;
