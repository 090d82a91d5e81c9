//! Output handling for human-readable and JSON modes

mod formatter;

pub use formatter::Formatter;

/// Output settings shared by all commands
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Emit strict JSON on stdout
    pub json: bool,
    /// Disable colors
    pub no_color: bool,
    /// Suppress non-error output
    pub quiet: bool,
}
