//! Command-line parsing for the `pwv` binary.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! calibration/transmission code; dispatch lives in `app`.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "pwv", version, about = "Precipitable water vapor and atmospheric transmission modelling")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rebuild the composite PWV series from the site's receiver files.
    Model(ModelArgs),
    /// Print composite (or, with `--measured`, per-receiver) PWV rows,
    /// optionally restricted to a calendar period.
    Series(SeriesArgs),
    /// Print the line-of-sight PWV at a date and airmass.
    Pwv(PwvArgs),
    /// Evaluate atmospheric transmission for a PWV value or a date.
    Transmission(TransmissionArgs),
}

/// Site configuration source shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct SiteArgs {
    /// Site config JSON (falls back to `PWV_SITE_CONFIG`).
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ModelArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Where to write the composite CSV (defaults to `paths.composite`).
    #[arg(short = 'o', long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SeriesArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Show the receivers' own measurements instead of the composite series.
    #[arg(short = 'm', long)]
    pub measured: bool,

    #[arg(long)]
    pub year: Option<i32>,

    #[arg(long)]
    pub month: Option<u32>,

    #[arg(long)]
    pub day: Option<u32>,

    #[arg(long)]
    pub hour: Option<u32>,
}

#[derive(Debug, Args, Clone)]
pub struct PwvArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Query date (RFC 3339, e.g. `2020-06-01T04:30:00Z`).
    #[arg(short = 'd', long)]
    pub date: DateTime<Utc>,

    #[arg(short = 'a', long, default_value_t = 1.0)]
    pub airmass: f64,
}

#[derive(Debug, Args, Clone)]
pub struct TransmissionArgs {
    /// `wavelength,cross_section` table (Beer–Lambert model).
    #[arg(long, conflicts_with = "grid")]
    pub cross_sections: Option<PathBuf>,

    /// `pwv,<wavelength>...` transmission grid (interpolated model).
    #[arg(long)]
    pub grid: Option<PathBuf>,

    /// PWV value(s) in mm; repeat for one column per value.
    #[arg(short = 'p', long, conflicts_with = "date")]
    pub pwv: Vec<f64>,

    /// Uncertainty of a single `--pwv` value.
    #[arg(long, requires = "pwv")]
    pub pwv_err: Option<f64>,

    #[command(flatten)]
    pub site: SiteArgs,

    /// Evaluate at the PWV modelled for this date instead of `--pwv`.
    #[arg(short = 'd', long)]
    pub date: Option<DateTime<Utc>>,

    #[arg(short = 'a', long, default_value_t = 1.0)]
    pub airmass: f64,

    /// Bin the model to this resolution (Å) before interpolating.
    #[arg(short = 'r', long)]
    pub resolution: Option<f64>,

    /// Output CSV; prints to the terminal when omitted.
    #[arg(short = 'o', long)]
    pub out: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_transmission_for_pwv_values() {
        let cli = Cli::parse_from(["pwv", "transmission", "--cross-sections", "cs.csv", "-p", "4", "-p", "5"]);
        let Command::Transmission(args) = cli.command else {
            panic!("expected transmission");
        };
        assert_eq!(args.pwv, vec![4.0, 5.0]);
        assert_eq!(args.airmass, 1.0);
    }

    #[test]
    fn parses_rfc3339_dates() {
        let cli = Cli::parse_from(["pwv", "pwv", "--date", "2020-06-01T04:30:00Z", "-a", "1.5"]);
        let Command::Pwv(args) = cli.command else {
            panic!("expected pwv");
        };
        assert_eq!(args.date.to_rfc3339(), "2020-06-01T04:30:00+00:00");
        assert!(args.site.config.is_none());
    }

    #[test]
    fn parses_measured_series_query() {
        let cli = Cli::parse_from(["pwv", "series", "--measured", "--year", "2020", "--hour", "4"]);
        let Command::Series(args) = cli.command else {
            panic!("expected series");
        };
        assert!(args.measured);
        assert_eq!((args.year, args.month, args.hour), (Some(2020), None, Some(4)));
    }
}
