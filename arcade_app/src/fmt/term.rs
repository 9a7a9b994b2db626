//! Terminal capability detection and ANSI escape sequences.

use std::io;

/// Performs automatic detection of whether ANSI escape codes are supported.
pub fn supports_ansi_escapes<T: io::IsTerminal>(stream: &T) -> bool {
    use anstyle_query as a;

    let clicolor = a::clicolor();
    if a::no_color() {
        false
    } else if a::clicolor_force() {
        true
    } else if clicolor == Some(false) {
        false
    } else {
        stream.is_terminal() && (a::term_supports_color() || clicolor == Some(true) || a::is_ci())
    }
}

/// The escape sequences console frames use. Check support with
/// [`supports_ansi_escapes`] before writing them.
pub mod style {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";

    pub const RED: &str = "\x1b[38;5;1m";
    pub const YELLOW: &str = "\x1b[38;5;3m";
    pub const CYAN: &str = "\x1b[38;5;6m";
}
