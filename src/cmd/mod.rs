//! CLI command implementations.
//!
//! Each submodule owns one `Commands` variant:
//!
//! | Module       | Commands handled          |
//! |--------------|---------------------------|
//! | `edit`       | `Edit`                    |
//! | `transcribe` | `Transcribe`              |
//! | `share`      | `Share`, `View`           |
//! | `export`     | `Export`                  |

pub mod edit;
pub mod export;
pub mod share;
pub mod transcribe;

pub use edit::cmd_edit;
pub use export::cmd_export;
pub use share::{cmd_share, cmd_view};
pub use transcribe::cmd_transcribe;
