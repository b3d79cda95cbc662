use crate::generator::toolkit::SyntheticToolkit;
use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use log::{info, warn};
use qvpcore::processing::{DatasetAssembler, ProfileAccumulator, RunProvenance};
use qvpcore::registry::{FieldRegistry, MomentCatalog, SiteRegistry};
use qvpcore::render::QuicklookRenderer;
use qvpcore::store;
use std::path::{Path, PathBuf};

pub struct WorkflowResult {
    pub dataset: PathBuf,
    pub images: Vec<PathBuf>,
    pub processed: usize,
    pub skipped: usize,
}

/// Accumulate, assemble, write and draw for one site.
#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
    sites: SiteRegistry,
    fields: FieldRegistry,
    catalog: MomentCatalog,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> anyhow::Result<Self> {
        let sites = config.site_registry()?;
        sites
            .get(&config.site)
            .with_context(|| format!("resolving site {}", config.site))?;
        Ok(Self {
            config,
            sites,
            fields: FieldRegistry::builtin(),
            catalog: MomentCatalog::builtin(),
        })
    }

    pub fn execute<P: AsRef<Path>>(
        &self,
        files: &[P],
        provenance: &RunProvenance,
    ) -> anyhow::Result<WorkflowResult> {
        let toolkit = SyntheticToolkit::new(&self.catalog);
        let mut accumulator = match &self.config.moments {
            Some(moments) => ProfileAccumulator::with_moments(
                toolkit,
                &self.catalog,
                self.config.elevation_deg,
                moments.as_slice(),
            )
            .context("selecting moments")?,
            None => ProfileAccumulator::new(toolkit, &self.catalog, self.config.elevation_deg),
        };
        let series = accumulator
            .accumulate(files)
            .context("accumulating profiles")?;
        let (processed, skipped) = accumulator.stats().snapshot();

        let data_dir = store::resolve_directory(self.config.data_dir.as_deref())?;
        let dataset = DatasetAssembler::new(&self.sites, &self.catalog)
            .assemble_and_write(
                &series,
                &self.config.site,
                provenance,
                &data_dir,
                self.config.overwrite,
            )
            .context("writing dataset")?;

        let images = if series.is_empty() {
            warn!("no profiles for {}; skipping quicklooks", self.config.site);
            Vec::new()
        } else {
            self.quicklooks(&dataset)?
        };
        info!(
            "{}: {} profiles ({} skipped) -> {}",
            self.config.site,
            processed,
            skipped,
            dataset.display()
        );

        Ok(WorkflowResult {
            dataset,
            images,
            processed,
            skipped,
        })
    }

    /// Images configured in `quicklooks`; later renders overwrite earlier ones of the same day.
    pub fn quicklooks(&self, dataset: &Path) -> anyhow::Result<Vec<PathBuf>> {
        let looks = &self.config.quicklooks;
        if looks.single.is_empty() && looks.four_panel.is_none() {
            return Ok(Vec::new());
        }
        let image_dir = store::resolve_directory(self.config.image_dir.as_deref())?;
        let renderer = QuicklookRenderer::new(&self.sites, &self.fields);
        let site = self.config.site.as_str();

        let mut images = Vec::new();
        for field in &looks.single {
            let image = renderer
                .render_one_panel(dataset, field, site, &image_dir)
                .with_context(|| format!("drawing {} quicklook", field))?;
            images.push(image);
        }
        if let Some(fields) = &looks.four_panel {
            let fields = [
                fields[0].as_str(),
                fields[1].as_str(),
                fields[2].as_str(),
                fields[3].as_str(),
            ];
            let image = renderer
                .render_four_panel(dataset, fields, site, &image_dir)
                .context("drawing four-panel quicklook")?;
            images.push(image);
        }
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::scan::{write_day, DayPlan};
    use crate::workflow::config::QuicklookConfig;
    use chrono::{NaiveDate, TimeZone, Utc};
    use qvpcore::prelude::OverwritePolicy;
    use qvpcore::store::QvpDataset;

    fn provenance() -> RunProvenance {
        RunProvenance {
            command_line: "qvpdriver run".into(),
            created: Utc.with_ymd_and_hms(2019, 1, 2, 3, 4, 5).unwrap(),
            host: "testhost".into(),
        }
    }

    #[test]
    fn runner_writes_daily_dataset() {
        let scans = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let plan = DayPlan {
            scans: 3,
            gates: 40,
            ..Default::default()
        };
        let mut files = write_day(
            scans.path(),
            NaiveDate::from_ymd_opt(2017, 10, 5).unwrap(),
            &plan,
        )
        .unwrap();
        files.insert(1, scans.path().join("missing.json"));

        let cfg = WorkflowConfig {
            data_dir: Some(out.path().to_path_buf()),
            ..Default::default()
        };
        let runner = Runner::new(cfg).unwrap();
        let result = runner.execute(&files, &provenance()).unwrap();

        assert_eq!((result.processed, result.skipped), (3, 1));
        assert!(result.images.is_empty());
        assert_eq!(
            result.dataset,
            out.path().join("sgpxsaprqvpI5.c1.20171005.000000.nc")
        );
        let dataset = QvpDataset::open(&result.dataset).unwrap();
        assert_eq!(dataset.times.len(), 3);
        assert_eq!(dataset.height.len(), 40);
        assert_eq!(dataset.variables.len(), MomentCatalog::builtin().len());
    }

    #[test]
    fn refuse_policy_stops_second_run() {
        let scans = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let plan = DayPlan {
            scans: 1,
            gates: 10,
            ..Default::default()
        };
        let files = write_day(
            scans.path(),
            NaiveDate::from_ymd_opt(2017, 10, 5).unwrap(),
            &plan,
        )
        .unwrap();
        let cfg = WorkflowConfig {
            data_dir: Some(out.path().to_path_buf()),
            overwrite: OverwritePolicy::Refuse,
            moments: Some(vec!["corrected_reflectivity".into()]),
            ..Default::default()
        };
        let runner = Runner::new(cfg).unwrap();
        runner.execute(&files, &provenance()).unwrap();
        assert!(runner.execute(&files, &provenance()).is_err());
    }

    #[test]
    fn unknown_site_is_rejected_up_front() {
        let cfg = WorkflowConfig {
            site: "xsaprqvpI9".into(),
            ..Default::default()
        };
        assert!(Runner::new(cfg).is_err());
    }

    #[test]
    fn configured_quicklook_lands_next_to_the_day() {
        let scans = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let images = tempfile::tempdir().unwrap();
        let plan = DayPlan {
            scans: 2,
            gates: 20,
            ..Default::default()
        };
        let files = write_day(
            scans.path(),
            NaiveDate::from_ymd_opt(2018, 8, 31).unwrap(),
            &plan,
        )
        .unwrap();
        let cfg = WorkflowConfig {
            data_dir: Some(out.path().to_path_buf()),
            image_dir: Some(images.path().to_path_buf()),
            quicklooks: QuicklookConfig {
                single: vec!["corrected_reflectivity".into()],
                four_panel: None,
            },
            ..Default::default()
        };
        let result = Runner::new(cfg).unwrap().execute(&files, &provenance()).unwrap();

        let expected = images.path().join("sgpxsaprqvpI5.c1.20180831.000000.png");
        assert_eq!(result.images, vec![expected.clone()]);
        assert!(std::fs::metadata(&expected).unwrap().len() > 0);
    }
}
