// Menu-driven session over an already loaded dataset.
//
// Input and output are generic so the loop runs the same against a
// terminal and against in-memory buffers. End of input closes the session
// the same way the exit option does.
use crate::error::ReportError;
use crate::types::Report;
use crate::{output, util, Dataset};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, warn};

/// State of one interactive session. The last report is kept here and
/// handed to the exporter explicitly.
#[derive(Default)]
struct Session {
    month: Option<u32>,
    last_report: Option<Report>,
}

/// Print `prompt` and read one trimmed line. `None` once input is
/// exhausted or unreadable.
fn read_line<R: BufRead, W: Write>(input: &mut R, out: &mut W, prompt: &str) -> io::Result<Option<String>> {
    write!(out, "{}", prompt)?;
    out.flush()?;
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) => Ok(None),
        Ok(_) => Ok(Some(buf.trim().to_string())),
        Err(e) => {
            warn!(error = %e, "failed to read input");
            Ok(None)
        }
    }
}

pub fn run_session<R: BufRead, W: Write>(dataset: &Dataset, input: &mut R, out: &mut W) -> io::Result<()> {
    let mut session = Session::default();
    loop {
        let selected = session
            .month
            .map(util::month_name)
            .unwrap_or("-- none --");
        writeln!(out, "Filter month: {}", selected)?;
        writeln!(out, "[1] Choose month")?;
        writeln!(out, "[2] Branch summary")?;
        writeln!(out, "[3] Territory manager view")?;
        writeln!(out, "[4] Export last report")?;
        writeln!(out, "[0] Exit\n")?;
        let Some(choice) = read_line(input, out, "Enter choice: ")? else {
            debug!("input closed");
            writeln!(out)?;
            break;
        };
        match choice.as_str() {
            "1" => {
                let Some(answer) = read_line(input, out, "Month (1-12 or name): ")? else {
                    break;
                };
                match util::parse_month_arg(&answer) {
                    Ok(m) => session.month = Some(m),
                    Err(e) => writeln!(out, "{}\n", e)?,
                }
            }
            "2" => {
                let Some(month) = session.month else {
                    writeln!(out, "Please choose a month first.\n")?;
                    continue;
                };
                let report = dataset.branch_report(month);
                output::print_report(out, &report, &dataset.config.targets)?;
                session.last_report = Some(report);
            }
            "3" => {
                let Some(month) = session.month else {
                    writeln!(out, "Please choose a month first.\n")?;
                    continue;
                };
                let managers = dataset.resolver().territory_managers();
                if managers.is_empty() {
                    writeln!(out, "No territory managers found. Is a mapping feed configured?\n")?;
                    continue;
                }
                for (i, name) in managers.iter().enumerate() {
                    writeln!(out, "[{}] {}", i + 1, name)?;
                }
                let Some(answer) = read_line(
                    input,
                    out,
                    "Territory manager (number or name, blank for all): ",
                )?
                else {
                    break;
                };
                let tm = answer
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| managers.get(n.wrapping_sub(1)).cloned())
                    .or_else(|| (!answer.is_empty()).then(|| answer.clone()));
                match dataset.hierarchy_report(month, tm.as_deref()) {
                    Ok(report) => {
                        output::print_report(out, &report, &dataset.config.targets)?;
                        session.last_report = Some(report);
                    }
                    Err(e) => writeln!(out, "{}\n", e)?,
                }
            }
            "4" => {
                let Some(report) = session.last_report.as_ref() else {
                    writeln!(out, "No data to export. Generate a report first.\n")?;
                    continue;
                };
                let default_name = format!(
                    "activity_{}.csv",
                    report
                        .month()
                        .map(util::month_name)
                        .unwrap_or("report")
                        .to_lowercase()
                );
                let Some(answer) = read_line(input, out, &format!("Output file [{}]: ", default_name))? else {
                    break;
                };
                let path = if answer.is_empty() {
                    PathBuf::from(default_name)
                } else {
                    PathBuf::from(answer)
                };
                match output::write_export(&path, report, &dataset.config.targets) {
                    Ok(rows) => writeln!(
                        out,
                        "Exported {} rows to {}\n",
                        util::format_int(rows),
                        path.display()
                    )?,
                    Err(ReportError::NoExportData) => {
                        writeln!(out, "No data to export for this selection.\n")?
                    }
                    Err(e) => {
                        warn!(error = %e, "export failed");
                        writeln!(out, "Write error: {}\n", e)?;
                    }
                }
            }
            "0" => {
                writeln!(out, "Exiting the program.")?;
                break;
            }
            _ => writeln!(out, "Invalid choice. Please enter 0-4.\n")?,
        }
    }
    Ok(())
}
