//! Colored terminal output.

use std::io::{IsTerminal, Write};

use anyhow::Result;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Stdout stream that only emits colors when attached to a terminal.
pub(crate) fn stdout() -> StandardStream {
    let choice = if std::io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    StandardStream::stdout(choice)
}

/// Writes `text` in `color`, optionally bold, then resets.
pub(crate) fn write_colored(
    out: &mut impl WriteColor,
    color: Color,
    bold: bool,
    text: &str,
) -> Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold))?;
    write!(out, "{text}")?;
    out.reset()?;
    Ok(())
}

/// Prints a bold section heading followed by a newline.
pub(crate) fn heading(out: &mut impl WriteColor, text: &str) -> Result<()> {
    write_colored(out, Color::Cyan, true, text)?;
    writeln!(out)?;
    Ok(())
}
