use crate::math::StatsHelper;
use crate::prelude::{OverwritePolicy, QvpError, QvpResult};
use crate::processing::series::ProfileSeries;
use crate::registry::{MomentCatalog, MomentSpec, SiteRegistry, ValidRange};
use crate::store::{self, naming};
use crate::telemetry::LogManager;
use crate::toolkit_interface::SiteLocation;
use chrono::{DateTime, NaiveDate, Utc};
use ndarray::{Array1, Array2};
use std::path::{Path, PathBuf};

/// Who produced a dataset, where and when.
#[derive(Debug, Clone, PartialEq)]
pub struct RunProvenance {
    pub command_line: String,
    pub created: DateTime<Utc>,
    pub host: String,
}

impl RunProvenance {
    /// Provenance of the running process: its arguments, the clock and the host name.
    pub fn capture() -> Self {
        Self {
            command_line: std::env::args().collect::<Vec<_>>().join(" "),
            created: Utc::now(),
            host: gethostname::gethostname().to_string_lossy().into_owned(),
        }
    }

    pub fn history(&self) -> String {
        format!(
            "Created on {} at {} using qvpcore",
            self.host,
            self.created.format("%Y-%m-%dT%H:%M:%S%.6f")
        )
    }
}

/// One `(time, height)` moment variable ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetVariable {
    pub spec: MomentSpec,
    pub data: Array2<f32>,
    /// Resolved `valid_min` / `valid_max`, if the moment declares a range.
    pub valid_range: Option<(f64, f64)>,
}

/// Stacked QVP dataset for one site and run, immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledDataset {
    pub site: String,
    pub datastream: String,
    pub times: Vec<DateTime<Utc>>,
    pub height: Array1<f64>,
    pub location: Option<SiteLocation>,
    pub variables: Vec<DatasetVariable>,
    /// Global attributes in write order: site metadata, then provenance.
    pub attributes: Vec<(String, String)>,
    /// Calendar day used to name the output.
    pub date: NaiveDate,
}

impl AssembledDataset {
    pub fn file_name(&self, extension: &str) -> String {
        naming::daily_file_name(&self.datastream, self.date, extension)
    }

    pub fn variable(&self, name: &str) -> Option<&DatasetVariable> {
        self.variables.iter().find(|var| var.spec.name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Stacks a [`ProfileSeries`] into a labelled dataset and persists it.
pub struct DatasetAssembler<'a> {
    sites: &'a SiteRegistry,
    catalog: &'a MomentCatalog,
    logger: LogManager,
}

impl<'a> DatasetAssembler<'a> {
    pub fn new(sites: &'a SiteRegistry, catalog: &'a MomentCatalog) -> Self {
        Self {
            sites,
            catalog,
            logger: LogManager::new("assembler"),
        }
    }

    /// Build the dataset for `site` from a complete series.
    ///
    /// The time axis keeps accumulation order. Moments missing from some
    /// steps are left out of the dataset.
    pub fn assemble(
        &self,
        series: &ProfileSeries,
        site: &str,
        provenance: &RunProvenance,
    ) -> QvpResult<AssembledDataset> {
        let profile = self.sites.get(site)?;

        let mut variables = Vec::new();
        for spec in self.catalog.iter() {
            if series.column(&spec.name).is_none() {
                continue;
            }
            let data = match series.stack(&spec.name) {
                Ok(data) => data,
                Err(QvpError::InconsistentSeries {
                    moment,
                    present,
                    total,
                }) => {
                    self.logger.caution(&format!(
                        "omitting {}: present in {} of {} profiles",
                        moment, present, total
                    ));
                    continue;
                }
                Err(err) => return Err(err),
            };
            let valid_range = resolve_valid_range(spec, &data);
            variables.push(DatasetVariable {
                spec: spec.clone(),
                data,
                valid_range,
            });
        }

        let date = match series.times().first() {
            Some(first) => first.date_naive(),
            None => {
                self.logger.caution(&format!(
                    "assembling {} with no time steps; naming by creation date",
                    site
                ));
                provenance.created.date_naive()
            }
        };

        let mut attributes: Vec<(String, String)> = profile
            .global_attributes()
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        attributes.push(("command_line".into(), provenance.command_line.clone()));
        attributes.push(("history".into(), provenance.history()));

        Ok(AssembledDataset {
            site: site.to_string(),
            datastream: profile.datastream.clone(),
            times: series.times().to_vec(),
            height: Array1::from(series.height().to_vec()),
            location: series.location(),
            variables,
            attributes,
            date,
        })
    }

    /// Write `dataset` into `directory` as `<datastream>.<YYYYMMDD>.000000.nc`.
    pub fn write(
        &self,
        dataset: &AssembledDataset,
        directory: &Path,
        policy: OverwritePolicy,
    ) -> QvpResult<PathBuf> {
        let path = store::writer::write_dataset(dataset, directory, policy)?;
        self.logger.record(&format!(
            "wrote {} time steps x {} heights to {}",
            dataset.times.len(),
            dataset.height.len(),
            path.display()
        ));
        Ok(path)
    }

    pub fn assemble_and_write(
        &self,
        series: &ProfileSeries,
        site: &str,
        provenance: &RunProvenance,
        directory: &Path,
        policy: OverwritePolicy,
    ) -> QvpResult<PathBuf> {
        let dataset = self.assemble(series, site, provenance)?;
        self.write(&dataset, directory, policy)
    }
}

fn resolve_valid_range(spec: &MomentSpec, data: &Array2<f32>) -> Option<(f64, f64)> {
    match spec.valid_range? {
        ValidRange::Fixed { min, max } => Some((min, max)),
        ValidRange::DataExtent => StatsHelper::finite_extent(data.iter().copied())
            .map(|(lo, hi)| (f64::from(lo), f64::from(hi))),
    }
}
