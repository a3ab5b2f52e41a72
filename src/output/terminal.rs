//! Terminal output utilities.
//!
//! Progress lines go to stdout; diagnostics go through `log`.

use crate::models::PolicyAssignment;
use colored::Colorize;

/// Format a value as a quoted, left-aligned field.
///
/// # Arguments
/// * `value` - The value to format
/// * `width` - The minimum width of the field
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let quoted = format!("\"{}\"", value.to_string());
    format!("{quoted:<width$}")
}

/// Announce a step before it runs, e.g. `Creating a resource group with name: rg`.
pub fn print_step(action: &str, what: &str, name: &str) {
    log::info!("{action} {what}: {name}");
    println!("{action} {what}: {}", name.bold());
}

/// Report a created resource by id.
pub fn print_created(what: &str, id: &str) {
    log::info!("{what} created: {id}");
    println!("{} {what} created: {id}", "✔".green());
}

pub fn print_deleted(what: &str, name: &str) {
    log::info!("Deleted {what}: {name}");
    println!("{} Deleted {what}: {name}", "✔".green());
}

/// One line per listed assignment.
pub fn print_assignment(assignment: &PolicyAssignment) {
    let id = assignment
        .id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "None".to_string());
    println!(
        "Policy assignment: {id} {mode}",
        mode = format_field(assignment.properties.enforcement_mode, 14).cyan()
    );
}
