use std::borrow::Cow;
use std::io::Write;

use anyhow::Result;

use crate::config::OutputFormat;
use crate::report::{cell_text, Report};

use super::summary::render_summary;

/// Writes the report in the requested format.
///
/// - Table: overview plus the key per-repository columns
/// - CSV: a label header and one record per row, TOTAL last
/// - JSON: an array of row objects keyed by field, TOTAL last
pub fn export_report(
    report: &Report,
    period_label: &str,
    format: OutputFormat,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            write!(output, "{}", render_summary(report, period_label))?;
            Ok(())
        }
        OutputFormat::Csv => export_csv(report, output),
        OutputFormat::Json => export_json(report, pretty, output),
    }
}

fn export_json(report: &Report, pretty: bool, output: &mut dyn Write) -> Result<()> {
    let rows: Vec<_> = report.rows().collect();
    let json = if pretty {
        serde_json::to_string_pretty(&rows)?
    } else {
        serde_json::to_string(&rows)?
    };
    writeln!(output, "{json}")?;
    Ok(())
}

fn export_csv(report: &Report, output: &mut dyn Write) -> Result<()> {
    write_record(
        output,
        report.columns.iter().map(|column| column.label.clone()),
    )?;

    for row in report.rows() {
        write_record(
            output,
            report
                .columns
                .iter()
                .map(|column| row.get(column.key).map(cell_text).unwrap_or_default()),
        )?;
    }
    Ok(())
}

fn write_record(output: &mut dyn Write, fields: impl Iterator<Item = String>) -> Result<()> {
    let line = fields
        .map(|field| escape_field(&field).into_owned())
        .collect::<Vec<_>>()
        .join(",");
    write!(output, "{line}\r\n")?;
    Ok(())
}

/// Quotes a field containing a delimiter, quote or line break, doubling
/// embedded quotes.
fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
