//! Shared pipeline steps used by the subcommands.
//!
//! Everything here resolves files from a `SiteConfig` and hands in-memory
//! values to the library core:
//! receiver files -> composite series -> PWV at a date -> transmission

use std::path::{Path, PathBuf};

use crate::calibration::{AlignedMeasurements, align_receivers, update_composite_series};
use crate::domain::{CompositeSeries, MeasurementSeries, ReceiverId, SiteConfig};
use crate::error::{PwvError, Result};
use crate::io::{read_composite, read_cross_sections, read_measurements, read_transmission_grid, write_composite};
use crate::transmission::TransmissionModel;

/// Environment variable naming the default site config file.
pub const SITE_CONFIG_ENV: &str = "PWV_SITE_CONFIG";

/// Load the site config from `path`, or from `PWV_SITE_CONFIG` (a `.env` file
/// is honoured).
pub fn load_site_config(path: Option<&Path>) -> Result<SiteConfig> {
    if let Some(path) = path {
        return SiteConfig::load(path);
    }

    dotenvy::dotenv().ok();
    match std::env::var(SITE_CONFIG_ENV) {
        Ok(path) if !path.trim().is_empty() => SiteConfig::load(path.trim()),
        _ => Err(PwvError::InvalidConfig(format!(
            "no site config given; pass --config or set {SITE_CONFIG_ENV}"
        ))),
    }
}

/// Read every receiver file, build the composite series and write it to `out`
/// (or `paths.composite`) when a destination is known.
pub fn run_model(config: &SiteConfig, out: Option<&Path>) -> Result<CompositeSeries> {
    let (primary, secondaries) = read_receivers(config)?;
    let composite = update_composite_series(config, &primary, &secondaries)?;

    if let Some(dest) = out.or(config.paths.composite.as_deref()) {
        write_composite(dest, &composite)?;
        log::info!("wrote {} rows to {}", composite.len(), dest.display());
    }

    Ok(composite)
}

/// Raw receiver measurements aligned on date, primary column first.
pub fn load_measured(config: &SiteConfig) -> Result<AlignedMeasurements> {
    let (primary, secondaries) = read_receivers(config)?;
    let mut all = vec![&primary];
    all.extend(&secondaries);
    align_receivers(&all)
}

/// The primary series and every secondary that has a file, in config order.
fn read_receivers(config: &SiteConfig) -> Result<(MeasurementSeries, Vec<MeasurementSeries>)> {
    let data_dir = require_path(config.paths.data_dir.as_ref(), "paths.data_dir")?;

    let primary = read_measurements(&receiver_file(data_dir, &config.primary), config.primary.clone())?;
    log::info!("{}: {} measurements ({} usable)", primary.receiver, primary.len(), primary.present_count());

    let mut secondaries: Vec<MeasurementSeries> = Vec::with_capacity(config.secondaries.len());
    for id in &config.secondaries {
        let path = receiver_file(data_dir, id);
        if !path.exists() {
            log::warn!("{}: no measurement file for secondary receiver {id}", path.display());
            continue;
        }
        let series = read_measurements(&path, id.clone())?;
        log::info!("{id}: {} measurements ({} usable)", series.len(), series.present_count());
        secondaries.push(series);
    }

    Ok((primary, secondaries))
}

/// The persisted composite series of a site.
pub fn load_composite(config: &SiteConfig) -> Result<CompositeSeries> {
    let path = require_path(config.paths.composite.as_ref(), "paths.composite")?;
    read_composite(path)
}

/// Pick the transmission model from explicit files, falling back to the
/// site's cross-section table.
pub fn load_transmission_model(
    cross_sections: Option<&Path>,
    grid: Option<&Path>,
    config: Option<&SiteConfig>,
) -> Result<TransmissionModel> {
    if let Some(path) = grid {
        return Ok(read_transmission_grid(path)?.into());
    }
    let path = match cross_sections {
        Some(path) => path,
        None => require_path(config.and_then(|c| c.paths.cross_sections.as_ref()), "paths.cross_sections")?,
    };
    Ok(read_cross_sections(path)?.into())
}

fn receiver_file(data_dir: &Path, id: &ReceiverId) -> PathBuf {
    data_dir.join(format!("{id}.csv"))
}

fn require_path<'a>(path: Option<&'a PathBuf>, field: &str) -> Result<&'a Path> {
    path.map(PathBuf::as_path)
        .ok_or_else(|| PwvError::InvalidConfig(format!("`{field}` is not set")))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::domain::SitePaths;

    #[test]
    fn model_runs_from_receiver_files() {
        let dir = std::env::temp_dir().join(format!("pwv-atm-pipeline-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let mut kitt = String::from("date,pwv,pwv_err\n");
        let mut azam = String::from("date,pwv,pwv_err\n");
        for h in 0..12 {
            let p = 1.0 + h as f64 * 0.5;
            if h != 5 {
                kitt.push_str(&format!("2020-01-01T{h:02}:00:00Z,{p},0.1\n"));
            }
            azam.push_str(&format!("2020-01-01T{h:02}:00:00Z,{},0.2\n", 2.0 * p + 1.0));
        }
        fs::write(dir.join("KITT.csv"), kitt).unwrap();
        fs::write(dir.join("AZAM.csv"), azam).unwrap();

        let config = SiteConfig::builder()
            .site_name("kitt_peak")
            .primary("KITT")
            .secondary("AZAM")
            .secondary("P014")
            .paths(SitePaths {
                data_dir: Some(dir.clone()),
                composite: Some(dir.join("composite.csv")),
                cross_sections: None,
            })
            .build()
            .unwrap();

        let composite = run_model(&config, None).unwrap();
        let reloaded = load_composite(&config).unwrap();
        let measured = load_measured(&config).unwrap();
        fs::remove_dir_all(&dir).ok();

        let ids: Vec<&str> = measured.columns.iter().map(|c| c.receiver.as_str()).collect();
        assert_eq!(ids, vec!["KITT", "AZAM"]);
        assert_eq!(measured.dates.len(), 12);
        assert_eq!(measured.columns[0].values[5], None);
        assert_eq!(measured.columns[1].values[5], Some(8.0));

        assert_eq!(composite.len(), 12);
        assert!((composite.records()[5].pwv - 3.5).abs() < 1e-9);
        assert_eq!(reloaded, composite);
    }

    #[test]
    fn missing_paths_are_config_errors() {
        let config = SiteConfig::builder().site_name("kitt_peak").primary("KITT").build().unwrap();
        assert!(matches!(load_composite(&config), Err(PwvError::InvalidConfig(_))));
        assert!(matches!(
            load_transmission_model(None, None, Some(&config)),
            Err(PwvError::InvalidConfig(_))
        ));
    }
}
