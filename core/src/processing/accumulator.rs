use crate::prelude::{QvpError, QvpResult};
use crate::processing::series::{ProfileSeries, ProfileStep};
use crate::registry::{MomentCatalog, MomentSpec};
use crate::telemetry::{AccumulationStats, LogManager};
use crate::toolkit_interface::{ProfileRequest, RadarToolkit, RadarVolume};
use std::collections::BTreeMap;
use std::path::Path;

/// Walks scan files in caller order and records one profile step per readable file.
pub struct ProfileAccumulator<'a, T: RadarToolkit> {
    toolkit: T,
    catalog: &'a MomentCatalog,
    elevation_deg: f64,
    requested: Option<Vec<String>>,
    stats: AccumulationStats,
    logger: LogManager,
}

impl<'a, T: RadarToolkit> ProfileAccumulator<'a, T> {
    pub fn new(toolkit: T, catalog: &'a MomentCatalog, elevation_deg: f64) -> Self {
        Self {
            toolkit,
            catalog,
            elevation_deg,
            requested: None,
            stats: AccumulationStats::new(),
            logger: LogManager::new("accumulator"),
        }
    }

    /// Restrict the run to `moments`; every name must be catalogued.
    pub fn with_moments<S: AsRef<str>>(
        toolkit: T,
        catalog: &'a MomentCatalog,
        elevation_deg: f64,
        moments: &[S],
    ) -> QvpResult<ProfileAccumulator<'a, T>> {
        for name in moments {
            catalog.get(name.as_ref())?;
        }
        let mut accumulator = Self::new(toolkit, catalog, elevation_deg);
        accumulator.requested = Some(moments.iter().map(|m| m.as_ref().to_string()).collect());
        Ok(accumulator)
    }

    pub fn stats(&self) -> AccumulationStats {
        self.stats
    }

    pub fn toolkit(&self) -> &T {
        &self.toolkit
    }

    /// Build a series from `files`, in the order given.
    ///
    /// Files the toolkit cannot open are skipped. Any other failure aborts the
    /// run, including a scan whose height bins differ from the first scan and
    /// a retrieval that leaves out a selected moment the scan should carry.
    pub fn accumulate<P: AsRef<Path>>(&mut self, files: &[P]) -> QvpResult<ProfileSeries> {
        let mut series = ProfileSeries::new();
        let request = self.request();
        self.stats = AccumulationStats::new();

        for file in files {
            let path = file.as_ref();
            let volume = match self.toolkit.read(path) {
                Ok(volume) => volume,
                Err(err) if err.is_skippable() => {
                    self.logger.skipped(path, &err.to_string());
                    self.stats.record_skipped();
                    continue;
                }
                Err(err) => return Err(err),
            };

            let profile = self.toolkit.quasi_vertical_profile(&volume, &request)?;
            let mut moments = BTreeMap::new();
            for spec in self.selected() {
                if spec.conditional && !volume.declares_field(&spec.source) {
                    self.logger.caution(&format!(
                        "{} does not carry {}; leaving it out",
                        path.display(),
                        spec.source
                    ));
                    continue;
                }
                let values = profile.field(&spec.source).ok_or_else(|| {
                    QvpError::Retrieval(format!(
                        "{} returned no {} for {}",
                        path.display(),
                        spec.source,
                        spec.name
                    ))
                })?;
                moments.insert(spec.name.clone(), values.to_vec());
            }

            series.push(ProfileStep {
                source: path.to_path_buf(),
                time: volume.first_ray_time(),
                location: volume.location(),
                height: profile.height,
                moments,
            })?;
            self.stats.record_processed();
        }

        let (processed, skipped) = self.stats.snapshot();
        if series.is_empty() {
            self.logger.caution(&format!(
                "no scans accumulated from {} input files",
                files.len()
            ));
        } else {
            self.logger.record(&format!(
                "accumulated {} profiles at {:.1} deg ({} skipped)",
                processed, self.elevation_deg, skipped
            ));
        }
        Ok(series)
    }

    fn selected(&self) -> impl Iterator<Item = &MomentSpec> + '_ {
        self.catalog.iter().filter(move |spec| match &self.requested {
            Some(requested) => requested.contains(&spec.name),
            None => true,
        })
    }

    fn request(&self) -> ProfileRequest {
        ProfileRequest {
            elevation_deg: self.elevation_deg,
            fields: self
                .requested
                .as_ref()
                .map(|_| self.selected().map(|spec| spec.source.clone()).collect()),
        }
    }
}
