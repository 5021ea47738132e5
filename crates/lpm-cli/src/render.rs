//! Problems-panel text and JSON rendering of scan results.

use crossterm::style::{StyledContent, Stylize};
use lpm_core::{DiagnosticRecord, DiagnosticSeverity, ScanOutput};
use std::io::{self, Write};

/// Write one line per diagnostic, grouped by file:
/// `path:line:col: severity[code]: message (source)`, 1-based.
pub fn write_text(output: &ScanOutput, color: bool, out: &mut impl Write) -> io::Result<()> {
    for file in output.diagnostics.iter() {
        for record in &file.diagnostics {
            write_record(&file.path, record, color, out)?;
        }
    }

    let total = output.diagnostics.total();
    let summary = format!(
        "{total} problem{} in {} file{} ({} lines scanned)",
        plural(total),
        output.diagnostics.len(),
        plural(output.diagnostics.len()),
        output.lines_scanned
    );
    if color {
        writeln!(out, "{}", summary.dim())
    } else {
        writeln!(out, "{summary}")
    }
}

fn write_record(
    path: &str,
    record: &DiagnosticRecord,
    color: bool,
    out: &mut impl Write,
) -> io::Result<()> {
    let line = record.range.start_line.saturating_add(1);
    let column = record.range.start_char.saturating_add(1);
    let code = record
        .code
        .as_deref()
        .map(|c| format!("[{c}]"))
        .unwrap_or_default();
    let severity = record.severity.label();

    if color {
        writeln!(
            out,
            "{}:{line}:{column}: {}{code}: {} ({})",
            path.bold(),
            paint(severity, record.severity),
            record.message,
            record.source.as_str().dark_grey()
        )
    } else {
        writeln!(
            out,
            "{path}:{line}:{column}: {severity}{code}: {} ({})",
            record.message, record.source
        )
    }
}

fn paint(label: &str, severity: DiagnosticSeverity) -> StyledContent<&str> {
    match severity {
        DiagnosticSeverity::Error => label.red().bold(),
        DiagnosticSeverity::Warning => label.yellow().bold(),
        DiagnosticSeverity::Information => label.blue(),
        DiagnosticSeverity::Hint => label.dark_grey(),
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Write the grouped diagnostics as pretty-printed JSON.
pub fn write_json(output: &ScanOutput, out: &mut impl Write) -> anyhow::Result<()> {
    let report = serde_json::json!({
        "linesScanned": output.lines_scanned,
        "files": serde_json::to_value(&output.diagnostics)?,
    });
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lpm_core::{DiagnosticMap, DiagnosticRange, LINE_END, NO_FILE};
    use pretty_assertions::assert_eq;

    fn output() -> ScanOutput {
        let mut diagnostics = DiagnosticMap::new();
        diagnostics.push(
            "src/main.c",
            DiagnosticRecord {
                source: "LPM-gcc".into(),
                range: DiagnosticRange::new(11, 4, 11, LINE_END),
                severity: DiagnosticSeverity::Error,
                message: "expected ';'".into(),
                code: Some("E1".into()),
            },
        );
        diagnostics.push(
            NO_FILE,
            DiagnosticRecord {
                source: "LPM".into(),
                range: DiagnosticRange::new(1, 1, 1, 1),
                severity: DiagnosticSeverity::Hint,
                message: "No message found.".into(),
                code: None,
            },
        );
        ScanOutput {
            diagnostics,
            lines_scanned: 20,
        }
    }

    #[test]
    fn test_plain_text_is_one_based() {
        let mut buf = Vec::new();
        write_text(&output(), false, &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "src/main.c:12:5: error[E1]: expected ';' (LPM-gcc)\n\
             None:2:2: hint: No message found. (LPM)\n\
             2 problems in 2 files (20 lines scanned)\n"
        );
    }

    #[test]
    fn test_json_report_shape() {
        let mut buf = Vec::new();
        write_json(&output(), &mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["linesScanned"], 20);
        assert_eq!(value["files"][0]["path"], "src/main.c");
        assert_eq!(value["files"][0]["diagnostics"][0]["code"], "E1");
        assert_eq!(value["files"][1]["path"], "None");
    }
}
