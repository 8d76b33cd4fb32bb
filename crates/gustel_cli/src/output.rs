//! Terminal output for the CLI commands.

use owo_colors::OwoColorize;

/// Prints status lines to stdout with consistent coloring.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn status(&self, message: &str) {
        println!("{}", message.bright_white());
    }

    /// A `label value` pair.
    pub fn info(&self, label: &str, value: &str) {
        println!("{} {}", label.bright_cyan(), value);
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", "✓".bright_green(), message);
    }

    pub fn warning(&self, message: &str) {
        println!("{} {}", "⚠".yellow(), message.yellow());
    }

    pub fn list_item(&self, item: &str) {
        println!("  {} {}", "•".dimmed(), item);
    }
}
