//! Output formatting: table, JSON, YAML.

use std::io::{self, Write};

use tabled::{Table, Tabled, settings::Style};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Render a list in the chosen format; tables go through `to_row`.
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        _ => render_structured(format, data),
    }
}

/// Render a single item; tables use `detail_fn` for a key/value view.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> Vec<(&'static str, String)>,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => Ok(render_detail(&detail_fn(data))),
        _ => render_structured(format, data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct DetailRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn render_detail(pairs: &[(&'static str, String)]) -> String {
    let rows: Vec<DetailRow> = pairs
        .iter()
        .map(|(field, value)| DetailRow {
            field: *field,
            value: value.clone(),
        })
        .collect();
    render_table(&rows)
}

fn render_structured<T: serde::Serialize + ?Sized>(
    format: &OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    let rendered = match format {
        OutputFormat::Json | OutputFormat::Table => serde_json::to_string_pretty(data)
            .map_err(|e| CliError::Output(e.to_string())),
        OutputFormat::JsonCompact => {
            serde_json::to_string(data).map_err(|e| CliError::Output(e.to_string()))
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(data).map_err(|e| CliError::Output(e.to_string()))
        }
    }?;
    Ok(rendered.trim_end().to_owned())
}
