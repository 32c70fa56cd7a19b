use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tally::{DateError, DateKey, FileSource, LevelRollup, Report, ReportConfig};
use tally_table::{CsvWriteOptions, Table, write_csv};

mod output;

#[derive(Parser, Debug)]
#[command(
    name = "tally",
    version,
    about = "Roll up unit measurements and track them against scheduled targets"
)]
struct Cli {
    /// Storage directory with the hierarchy, snapshot, schedule and adjustment files.
    #[arg(long, global = true, default_value = ".")]
    dir: PathBuf,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest raw ID/VALUE files. The date comes from the first YYYYMMDD run
    /// in each file name unless --date is given.
    Feed {
        #[arg(required = true)]
        files: Vec<String>,

        #[arg(long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,
    },
    /// Activity in [START, END): snapshot delta plus adjustments.
    Stat {
        #[arg(value_parser = parse_date_arg)]
        start: NaiveDate,
        #[arg(value_parser = parse_date_arg)]
        end: NaiveDate,
    },
    /// Activity from the schedule start to END.
    StatBy {
        #[arg(value_parser = parse_date_arg)]
        end: NaiveDate,
    },
    /// Scheduled cumulative target at END.
    TargetBy {
        #[arg(value_parser = parse_date_arg)]
        end: NaiveDate,
    },
    /// Target for [START, END) given what was achieved before START.
    Target {
        #[arg(value_parser = parse_date_arg)]
        start: NaiveDate,
        #[arg(value_parser = parse_date_arg)]
        end: NaiveDate,
    },
    /// Print the unit hierarchy.
    Base,
    /// List ingested snapshot dates.
    Dates,
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, DateError> {
    tally::parse_date(s)
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback)),
        )
        .try_init();
}

fn open(dir: &Path, date: Option<NaiveDate>) -> Result<Report> {
    tracing::debug!(dir = %dir.display(), ?date, "opening storage");
    let config = ReportConfig::discover(dir)
        .with_context(|| format!("reading configuration in {}", dir.display()))?;
    let mut source = FileSource::new().with_options(config.read_options());
    if let Some(date) = date {
        source = source.with_date(date);
    }
    Report::load_with(dir, source, LevelRollup, config)
        .with_context(|| format!("loading report from {}", dir.display()))
}

fn print_table(table: &Table, out: &mut dyn Write) -> Result<()> {
    write_csv(table, out, &CsvWriteOptions::default()).context("writing output")
}

fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    match cli.command {
        Command::Feed { files, date } => {
            let mut report = open(&cli.dir, date)?;
            for file in &files {
                let date = report
                    .feed(file)
                    .with_context(|| format!("feeding {file}"))?;
                writeln!(out, "{}", DateKey::from(date))?;
            }
        }
        Command::Stat { start, end } => {
            let report = open(&cli.dir, None)?;
            let values = report.stat(start, end)?;
            print_table(&output::values_table(report.hierarchy(), &values), out)?;
        }
        Command::StatBy { end } => {
            let report = open(&cli.dir, None)?;
            let values = report.stat_by(end)?;
            print_table(&output::values_table(report.hierarchy(), &values), out)?;
        }
        Command::TargetBy { end } => {
            let report = open(&cli.dir, None)?;
            let values = report.target_by(end);
            print_table(&output::values_table(report.hierarchy(), &values), out)?;
        }
        Command::Target { start, end } => {
            let report = open(&cli.dir, None)?;
            let values = report.target(start, end)?;
            print_table(&output::values_table(report.hierarchy(), &values), out)?;
        }
        Command::Base => {
            let report = open(&cli.dir, None)?;
            print_table(&report.base().to_table(), out)?;
        }
        Command::Dates => {
            let report = open(&cli.dir, None)?;
            for date in report.dates() {
                writeln!(out, "{}", DateKey::from(date))?;
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(cli, &mut out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_testkit::StorageFixture;

    fn storage() -> StorageFixture {
        let fx = StorageFixture::new();
        fx.hierarchy(&[
            ("R", 1, None, 100.0),
            ("A", 0, Some("R"), 60.0),
            ("B", 0, Some("R"), 40.0),
        ])
        .schedule(&[("20240101", 0.0), ("20240131", 1.0)])
        .adjustments(&[]);
        fx
    }

    fn run_args(fx: &StorageFixture, args: &[&str]) -> Result<String> {
        let dir = fx.path().to_str().unwrap();
        let argv = ["tally", "--dir", dir].into_iter().chain(args.iter().copied());
        let cli = Cli::try_parse_from(argv)?;
        let mut out = Vec::new();
        run(cli, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn feed_then_query() {
        let fx = storage();
        let zero = fx.write_text("zero.csv", "ID,VALUE\n");
        let day = fx.write_text("sales_20240115.csv", "ID,VALUE\nA,30\nB,20\n");

        let printed = run_args(
            &fx,
            &["feed", zero.to_str().unwrap(), "--date", "20231231"],
        )
        .unwrap();
        assert_eq!(printed, "20231231\n");
        assert_eq!(
            run_args(&fx, &["feed", day.to_str().unwrap()]).unwrap(),
            "20240115\n"
        );

        assert_eq!(
            run_args(&fx, &["stat", "20240101", "20240116"]).unwrap(),
            "ID,NAME,VALUE\nR,Unit R,50\nA,Unit A,30\nB,Unit B,20\n"
        );
        assert_eq!(
            run_args(&fx, &["target-by", "20240116"]).unwrap(),
            "ID,NAME,VALUE\nR,Unit R,50\nA,Unit A,30\nB,Unit B,20\n"
        );
        assert_eq!(
            run_args(&fx, &["dates"]).unwrap(),
            "20231231\n20240115\n"
        );
    }

    #[test]
    fn base_prints_hierarchy() {
        let fx = storage();
        let printed = run_args(&fx, &["base"]).unwrap();
        assert!(printed.starts_with("ID,NAME,LEVEL,SUPER,TARGET\nR,Unit R,1,,100\n"));
    }

    #[test]
    fn errors_are_reported() {
        let fx = storage();
        let err = run_args(&fx, &["stat", "20240101", "20240116"]).unwrap_err();
        assert!(format!("{err:#}").contains("20231231"));

        assert!(Cli::try_parse_from(["tally", "stat", "2024-01-01", "20240116"]).is_err());
        assert!(Cli::try_parse_from(["tally", "feed"]).is_err());
    }
}
