//! Projects command for listing known projects.

use std::io::Write;

use anyhow::Result;

use jot_core::display_project;
use jot_db::Database;

/// Format project names for output.
pub fn format_projects(names: &[String]) -> String {
    use std::fmt::Write as _;

    let mut output = String::new();
    writeln!(output, "PROJECTS").unwrap();
    writeln!(output).unwrap();

    if names.is_empty() {
        writeln!(output, "No projects yet.").unwrap();
        return output;
    }
    for name in names {
        writeln!(output, "{}", display_project(name)).unwrap();
    }
    output
}

/// Runs the projects command.
pub fn run<W: Write>(writer: &mut W, db: &Database) -> Result<()> {
    let names: Vec<String> = db
        .list_projects()?
        .into_iter()
        .map(|project| project.name)
        .collect();
    write!(writer, "{}", format_projects(&names))?;
    Ok(())
}
