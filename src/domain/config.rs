//! Site configuration.
//!
//! A `SiteConfig` is passed explicitly to everything that needs to know which
//! receivers belong to a site. It is only ever produced by
//! `SiteConfigBuilder::build`, which validates required fields once and
//! normalizes identifier case.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{DataCut, ReceiverId};
use crate::error::{PwvError, Result};

/// Longest stretch without data that date interpolation will bridge.
pub const DEFAULT_MAX_GAP_SECS: f64 = 24.0 * 60.0 * 60.0;

/// On-disk locations owned by a site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SitePaths {
    /// Directory holding one `<RECEIVER>.csv` measurement file per receiver.
    pub data_dir: Option<PathBuf>,
    /// Composite PWV series written by `pwv model`.
    pub composite: Option<PathBuf>,
    /// `wavelength,cross_section` table for the Beer–Lambert model.
    pub cross_sections: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteConfig {
    pub site_name: String,
    pub primary: ReceiverId,
    pub secondaries: Vec<ReceiverId>,
    pub data_cuts: BTreeMap<ReceiverId, Vec<DataCut>>,
    pub max_gap_secs: f64,
    pub paths: SitePaths,
}

impl SiteConfig {
    pub fn builder() -> SiteConfigBuilder {
        SiteConfigBuilder::default()
    }

    /// Read a JSON config file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| PwvError::io(path, e))?;
        let builder: SiteConfigBuilder = serde_json::from_str(&text).map_err(|e| PwvError::json(path, e))?;
        builder.build()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self).map_err(|e| PwvError::json(path, e))?;
        fs::write(path, text).map_err(|e| PwvError::io(path, e))
    }

    /// Cuts registered for `receiver` (empty if none).
    pub fn cuts_for(&self, receiver: &ReceiverId) -> &[DataCut] {
        self.data_cuts.get(receiver).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Primary receiver followed by the secondaries.
    pub fn receivers(&self) -> impl Iterator<Item = &ReceiverId> {
        std::iter::once(&self.primary).chain(&self.secondaries)
    }
}

/// Collects site settings; `build` is the single validation step.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SiteConfigBuilder {
    site_name: Option<String>,
    primary: Option<String>,
    secondaries: Vec<String>,
    data_cuts: BTreeMap<String, Vec<DataCut>>,
    max_gap_secs: Option<f64>,
    paths: SitePaths,
}

impl SiteConfigBuilder {
    pub fn site_name(mut self, name: impl Into<String>) -> Self {
        self.site_name = Some(name.into());
        self
    }

    pub fn primary(mut self, id: impl Into<String>) -> Self {
        self.primary = Some(id.into());
        self
    }

    pub fn secondary(mut self, id: impl Into<String>) -> Self {
        self.secondaries.push(id.into());
        self
    }

    pub fn data_cut(mut self, receiver: impl Into<String>, cut: DataCut) -> Self {
        self.data_cuts.entry(receiver.into()).or_default().push(cut);
        self
    }

    pub fn max_gap_secs(mut self, secs: f64) -> Self {
        self.max_gap_secs = Some(secs);
        self
    }

    pub fn paths(mut self, paths: SitePaths) -> Self {
        self.paths = paths;
        self
    }

    pub fn build(self) -> Result<SiteConfig> {
        let site_name = self
            .site_name
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| PwvError::InvalidConfig("missing required field `site_name`".into()))?;
        let primary = self
            .primary
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| PwvError::InvalidConfig("missing required field `primary`".into()))?;

        let lower = site_name.to_lowercase();
        if lower != site_name {
            log::warn!("site names are lower case; `{site_name}` will be saved as `{lower}`");
        }

        let primary = normalize_id(&primary);
        let mut secondaries: Vec<ReceiverId> = Vec::with_capacity(self.secondaries.len());
        for id in self.secondaries.iter().map(|s| normalize_id(s)) {
            if id == primary || secondaries.contains(&id) {
                return Err(PwvError::InvalidConfig(format!("receiver {id} is listed more than once")));
            }
            secondaries.push(id);
        }

        let mut data_cuts = BTreeMap::new();
        for (receiver, cuts) in self.data_cuts {
            let receiver = ReceiverId::new(&receiver);
            if receiver != primary && !secondaries.contains(&receiver) {
                return Err(PwvError::InvalidConfig(format!(
                    "data cuts given for receiver {receiver}, which is not part of site {lower}"
                )));
            }
            if let Some(cut) = cuts.iter().find(|c| !(c.start <= c.end)) {
                return Err(PwvError::InvalidConfig(format!(
                    "{receiver}: cut on {:?} starts after it ends ({} > {})",
                    cut.param, cut.start, cut.end
                )));
            }
            data_cuts.insert(receiver, cuts);
        }

        let max_gap_secs = self.max_gap_secs.unwrap_or(DEFAULT_MAX_GAP_SECS);
        if !(max_gap_secs > 0.0) {
            return Err(PwvError::InvalidConfig(format!(
                "max_gap_secs must be positive, got {max_gap_secs}"
            )));
        }

        Ok(SiteConfig {
            site_name: lower,
            primary,
            secondaries,
            data_cuts,
            max_gap_secs,
            paths: self.paths,
        })
    }
}

fn normalize_id(raw: &str) -> ReceiverId {
    let id = ReceiverId::new(raw);
    if id.as_str().chars().count() != 4 {
        log::warn!("receiver id is not of expected length 4: {id}");
    }
    if raw.trim() != id.as_str() {
        log::warn!("receiver ids are upper case; `{raw}` will be saved as `{id}`");
    }
    id
}
