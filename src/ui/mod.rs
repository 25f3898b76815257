//! Terminal output for the restyle CLI.

pub mod progress;

pub use progress::EditProgress;
