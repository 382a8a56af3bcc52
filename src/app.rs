//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the site config and model tables
//! - runs the calibration / interpolation / transmission core
//! - prints reports and writes optional CSV output

use clap::Parser;

use crate::cli::{Cli, Command, ModelArgs, PwvArgs, SeriesArgs, TransmissionArgs};
use crate::error::{PwvError, Result};
use crate::pwv::{pwv_at, transmission_for_date};
use crate::transmission::Transmission;

pub mod pipeline;

/// Entry point for the `pwv` binary.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Model(args) => handle_model(args),
        Command::Series(args) => handle_series(args),
        Command::Pwv(args) => handle_pwv(args),
        Command::Transmission(args) => handle_transmission(args),
    }
}

fn handle_model(args: ModelArgs) -> Result<()> {
    let config = pipeline::load_site_config(args.site.config.as_deref())?;
    let composite = pipeline::run_model(&config, args.out.as_deref())?;
    println!("{}", crate::report::format_composite_summary(&config, &composite));
    Ok(())
}

fn handle_series(args: SeriesArgs) -> Result<()> {
    let config = pipeline::load_site_config(args.site.config.as_deref())?;
    if args.measured {
        let measured = pipeline::load_measured(&config)?;
        let selected = measured.select(args.year, args.month, args.day, args.hour)?;
        println!("{}", crate::report::format_measured_rows(&selected));
        return Ok(());
    }

    let composite = pipeline::load_composite(&config)?;
    let selected = composite.select(args.year, args.month, args.day, args.hour)?;
    println!("{}", crate::report::format_composite_rows(&selected));
    Ok(())
}

fn handle_pwv(args: PwvArgs) -> Result<()> {
    let config = pipeline::load_site_config(args.site.config.as_deref())?;
    let composite = pipeline::load_composite(&config)?;
    let los = pwv_at(args.date, args.airmass, &composite, config.max_gap_secs)?;
    println!("{}", crate::report::format_line_of_sight(args.date, args.airmass, &los));
    Ok(())
}

fn handle_transmission(args: TransmissionArgs) -> Result<()> {
    if let Some(date) = args.date {
        let config = pipeline::load_site_config(args.site.config.as_deref())?;
        let model =
            pipeline::load_transmission_model(args.cross_sections.as_deref(), args.grid.as_deref(), Some(&config))?;
        let composite = pipeline::load_composite(&config)?;
        let spectrum = transmission_for_date(&model, &composite, &config, date, args.airmass, None, args.resolution)?;
        return match &args.out {
            Some(path) => crate::io::write_spectrum(path, &spectrum),
            None => {
                println!("{}", crate::report::format_spectrum(&spectrum));
                Ok(())
            }
        };
    }

    let model = pipeline::load_transmission_model(args.cross_sections.as_deref(), args.grid.as_deref(), None)?;
    match args.pwv.as_slice() {
        [] => Err(PwvError::InvalidConfig("pass --pwv or --date".into())),
        [pwv] => {
            let spectrum = model.evaluate_with_error(*pwv, args.pwv_err, None, args.resolution)?;
            match &args.out {
                Some(path) => crate::io::write_spectrum(path, &spectrum),
                None => {
                    println!("{}", crate::report::format_spectrum(&spectrum));
                    Ok(())
                }
            }
        }
        many => {
            if args.pwv_err.is_some() {
                log::warn!("--pwv-err is ignored when several --pwv values are given");
            }
            let table = model.evaluate_many(many, None, args.resolution)?;
            match &args.out {
                Some(path) => crate::io::write_table(path, &table),
                None => {
                    println!("{}", crate::report::format_table(&table));
                    Ok(())
                }
            }
        }
    }
}
