//! Tags command for listing known tags.

use std::io::Write;

use anyhow::Result;

use jot_core::display_tag;
use jot_db::Database;

/// Format tag names for output.
pub fn format_tags(names: &[String]) -> String {
    use std::fmt::Write as _;

    let mut output = String::new();
    writeln!(output, "TAGS").unwrap();
    writeln!(output).unwrap();

    if names.is_empty() {
        writeln!(output, "No tags yet.").unwrap();
        return output;
    }
    for name in names {
        writeln!(output, "{}", display_tag(name)).unwrap();
    }
    output
}

/// Runs the tags command.
pub fn run<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    let names: Vec<String> = db.list_tags()?.into_iter().map(|tag| tag.name).collect();
    write!(writer, "{}", format_tags(&names))?;
    Ok(())
}
