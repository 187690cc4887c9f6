use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use tprune::Report;

use crate::error::CliResult;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        }
    }
}

pub fn render_report(report: &Report, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL_CONDENSED)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(["Resource", "Pages", "Scanned", "Kept", "Deleted", "Would delete"]);

            for sweep in &report.sweeps {
                table.add_row([
                    sweep.kind.to_string(),
                    sweep.pages.to_string(),
                    sweep.scanned.to_string(),
                    sweep.kept.to_string(),
                    sweep.deleted.to_string(),
                    sweep.would_delete.to_string(),
                ]);
            }

            let mode = if report.dry_run { " (dry run)" } else { "" };
            Ok(format!(
                "Pruned @{} ({}){mode}\n{table}",
                report.screen_name, report.account_id
            ))
        }
    }
}

pub fn print_report(report: &Report, format: OutputFormat) -> CliResult<()> {
    println!("{}", render_report(report, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tprune::{ResourceKind, SweepStats};

    fn report() -> Report {
        Report {
            account_id: 6253282,
            screen_name: "pruner".to_string(),
            dry_run: true,
            sweeps: vec![SweepStats {
                kind: ResourceKind::Favorites,
                pages: 2,
                scanned: 250,
                kept: 240,
                deleted: 0,
                would_delete: 10,
            }],
        }
    }

    #[test]
    fn test_table_output() {
        let out = render_report(&report(), OutputFormat::Table).unwrap();
        assert!(out.starts_with("Pruned @pruner (6253282) (dry run)"));
        assert!(out.contains("Would delete"));
        assert!(out.contains("favorites"));
        assert!(out.contains("250"));
    }

    #[test]
    fn test_json_output() {
        let out = render_report(&report(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["screen_name"], "pruner");
        assert_eq!(value["sweeps"][0]["kind"], "favorites");
        assert_eq!(value["sweeps"][0]["would_delete"], 10);
    }

    #[test]
    fn test_format_from_flag() {
        assert_eq!(OutputFormat::from_json_flag(true), OutputFormat::Json);
        assert_eq!(OutputFormat::from_json_flag(false), OutputFormat::Table);
    }
}
