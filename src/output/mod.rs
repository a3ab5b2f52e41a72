//! Console output for the sample run.
//!
//! - [`terminal`] - Coloured progress lines

mod terminal;

pub use terminal::{format_field, print_assignment, print_created, print_deleted, print_step};
