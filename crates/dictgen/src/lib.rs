pub mod artifacts;

pub use artifacts::{bundled, phrases, write_artifact};
