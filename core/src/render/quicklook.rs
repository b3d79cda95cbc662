use crate::math::StatsHelper;
use crate::prelude::{QvpError, QvpResult};
use crate::registry::{FieldRegistry, FieldSpec, SiteProfile, SiteRegistry};
use crate::render::colormap::Colormap;
use crate::store::{daily_file_name, QvpDataset, IMAGE_EXTENSION};
use crate::telemetry::LogManager;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use ndarray::Array2;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

const HOURS_PER_DAY: f64 = 24.0;
const TOP_KM: f64 = 12.0;
const LONE_SCAN_WIDTH_H: f64 = 0.25;
const STAMP: &str = "%Y-%m-%d %H:%M";

/// One colour-mesh panel, fully resolved before anything is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub field: String,
    pub title: String,
    pub colorbar_label: String,
    pub limits: (f64, f64),
    /// Cell boundaries in hours since the start of the day.
    pub time_edges: Vec<f64>,
    pub height_edges_km: Vec<f64>,
    pub data: Array2<f32>,
}

/// Everything needed to draw one quicklook image.
#[derive(Debug, Clone, PartialEq)]
pub struct QuicklookPlan {
    pub path: PathBuf,
    pub title: String,
    pub day_start: DateTime<Utc>,
    pub day_end: DateTime<Utc>,
    pub panels: Vec<Panel>,
}

/// Draws one- and four-panel time/height images from a stored dataset.
pub struct QuicklookRenderer<'a> {
    sites: &'a SiteRegistry,
    fields: &'a FieldRegistry,
    colormap: Colormap,
    logger: LogManager,
}

impl<'a> QuicklookRenderer<'a> {
    pub fn new(sites: &'a SiteRegistry, fields: &'a FieldRegistry) -> Self {
        Self {
            sites,
            fields,
            colormap: Colormap::rainbow(),
            logger: LogManager::new("quicklook"),
        }
    }

    pub fn render_one_panel(
        &self,
        dataset: &Path,
        field: &str,
        site: &str,
        image_dir: &Path,
    ) -> QvpResult<PathBuf> {
        let plan = self.plan_from_file(dataset, &[field], site, image_dir)?;
        self.draw(&plan, (1100, 520))?;
        Ok(plan.path)
    }

    /// Four stacked panels sharing the time axis, top to bottom in `fields` order.
    pub fn render_four_panel(
        &self,
        dataset: &Path,
        fields: [&str; 4],
        site: &str,
        image_dir: &Path,
    ) -> QvpResult<PathBuf> {
        let plan = self.plan_from_file(dataset, &fields, site, image_dir)?;
        self.draw(&plan, (1100, 1700))?;
        Ok(plan.path)
    }

    fn plan_from_file(
        &self,
        dataset: &Path,
        fields: &[&str],
        site: &str,
        image_dir: &Path,
    ) -> QvpResult<QuicklookPlan> {
        // registry lookups fail before the file is touched
        let profile = self.sites.get(site)?;
        let specs = fields
            .iter()
            .map(|field| self.fields.get(field))
            .collect::<QvpResult<Vec<_>>>()?;
        let dataset = QvpDataset::open(dataset)?;
        self.plan(&dataset, fields, &specs, profile, image_dir)
    }

    /// Resolve titles, limits and cell geometry for `fields` of `dataset`.
    pub fn plan(
        &self,
        dataset: &QvpDataset,
        fields: &[&str],
        specs: &[&FieldSpec],
        profile: &SiteProfile,
        image_dir: &Path,
    ) -> QvpResult<QuicklookPlan> {
        let day = dataset
            .first_date()
            .ok_or_else(|| QvpError::MalformedDataset {
                path: dataset.path().to_path_buf(),
                reason: "no time steps to plot".into(),
            })?;
        let day_start = start_of_day(day);
        let day_end = day_start + Duration::days(1);

        let hours: Vec<f64> = dataset
            .times
            .iter()
            .map(|t| (*t - day_start).num_seconds() as f64 / 3600.0)
            .collect();
        let heights_km: Vec<f64> = dataset.height.iter().map(|h| h / 1000.0).collect();
        let time_edges = cell_edges(&hours, LONE_SCAN_WIDTH_H);
        let height_edges_km = cell_edges(&heights_km, 0.1);

        let mut panels = Vec::with_capacity(fields.len());
        for (field, spec) in fields.iter().zip(specs) {
            let data = dataset.variable(field)?.clone();
            panels.push(Panel {
                field: field.to_string(),
                title: spec.title.clone(),
                colorbar_label: spec.colorbar_label.clone(),
                limits: color_limits(spec, &data),
                time_edges: time_edges.clone(),
                height_edges_km: height_edges_km.clone(),
                data,
            });
        }

        let window = format!("{}-{}", day_start.format(STAMP), day_end.format(STAMP));
        let title = match panels.as_slice() {
            [single] => format!(
                "{} {} {} {}",
                profile.plot.title, single.title, profile.plot.tilt, window
            ),
            _ => format!("{} {} {}", profile.plot.title, profile.plot.tilt, window),
        };

        Ok(QuicklookPlan {
            path: image_dir.join(daily_file_name(&profile.datastream, day, IMAGE_EXTENSION)),
            title,
            day_start,
            day_end,
            panels,
        })
    }

    fn draw(&self, plan: &QuicklookPlan, size: (u32, u32)) -> QvpResult<()> {
        if let Some(parent) = plan.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let root = BitMapBackend::new(&plan.path, size).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        if let [panel] = plan.panels.as_slice() {
            self.draw_panel(&root, panel, &plan.title)?;
        } else {
            let body = root.titled(&plan.title, ("sans-serif", 24)).map_err(render_err)?;
            let areas = body.split_evenly((plan.panels.len(), 1));
            for (area, panel) in areas.iter().zip(&plan.panels) {
                self.draw_panel(area, panel, &panel.title)?;
            }
        }

        root.present().map_err(render_err)?;
        self.logger
            .record(&format!("wrote quicklook {}", plan.path.display()));
        Ok(())
    }

    fn draw_panel(
        &self,
        area: &DrawingArea<BitMapBackend<'_>, Shift>,
        panel: &Panel,
        caption: &str,
    ) -> QvpResult<()> {
        let (width, _) = area.dim_in_pixel();
        let (mesh_area, bar_area) = area.split_horizontally((width as i32 - 120).max(1));

        let mut chart = ChartBuilder::on(&mesh_area)
            .caption(caption, ("sans-serif", 18))
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(55)
            .build_cartesian_2d(0.0..HOURS_PER_DAY, 0.0..TOP_KM)
            .map_err(render_err)?;
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(9)
            .x_label_formatter(&|h| format!("{:02.0}:00", h))
            .x_desc("Time (UTC)")
            .y_desc("Height (km)")
            .draw()
            .map_err(render_err)?;

        let cells = panel.data.indexed_iter().filter_map(|((t, h), value)| {
            if !value.is_finite() {
                return None;
            }
            let color = self.colormap.scaled(f64::from(*value), panel.limits);
            Some(Rectangle::new(
                [
                    (panel.time_edges[t], panel.height_edges_km[h]),
                    (panel.time_edges[t + 1], panel.height_edges_km[h + 1]),
                ],
                color.filled(),
            ))
        });
        chart.draw_series(cells).map_err(render_err)?;

        self.draw_colorbar(&bar_area, panel)
    }

    fn draw_colorbar(
        &self,
        area: &DrawingArea<BitMapBackend<'_>, Shift>,
        panel: &Panel,
    ) -> QvpResult<()> {
        let (vmin, vmax) = panel.limits;
        let mut bar = ChartBuilder::on(area)
            .margin_top(40)
            .margin_bottom(45)
            .margin_left(5)
            .set_label_area_size(LabelAreaPosition::Right, 70)
            .build_cartesian_2d(0.0..1.0, vmin..vmax)
            .map_err(render_err)?;
        bar.configure_mesh()
            .disable_mesh()
            .disable_x_axis()
            .y_labels(6)
            .y_desc(panel.colorbar_label.as_str())
            .draw()
            .map_err(render_err)?;

        let steps = 128;
        let step = (vmax - vmin) / steps as f64;
        bar.draw_series((0..steps).map(|i| {
            let lo = vmin + step * i as f64;
            Rectangle::new(
                [(0.0, lo), (1.0, lo + step)],
                self.colormap.scaled(lo + step / 2.0, panel.limits).filled(),
            )
        }))
        .map_err(render_err)?;
        Ok(())
    }
}

fn render_err<E: std::fmt::Display>(err: E) -> QvpError {
    QvpError::Render(err.to_string())
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(day.and_hms_opt(0, 0, 0).unwrap_or_default(), Utc)
}

/// Registry limits where given, the finite data extent otherwise.
fn color_limits(spec: &FieldSpec, data: &Array2<f32>) -> (f64, f64) {
    let extent = StatsHelper::finite_extent(data.iter().copied())
        .map(|(lo, hi)| (f64::from(lo), f64::from(hi)));
    let vmin = spec.vmin.or(extent.map(|e| e.0)).unwrap_or(0.0);
    let vmax = spec.vmax.or(extent.map(|e| e.1)).unwrap_or(1.0);
    if vmax > vmin {
        (vmin, vmax)
    } else {
        (vmin - 0.5, vmin + 0.5)
    }
}

/// Boundaries between cells centred on `centers`, ends extended by half a spacing.
pub(crate) fn cell_edges(centers: &[f64], lone_width: f64) -> Vec<f64> {
    match centers {
        [] => Vec::new(),
        [only] => vec![only - lone_width / 2.0, only + lone_width / 2.0],
        _ => {
            let n = centers.len();
            let mut edges = Vec::with_capacity(n + 1);
            edges.push(centers[0] - (centers[1] - centers[0]) / 2.0);
            edges.extend(centers.windows(2).map(|w| (w[0] + w[1]) / 2.0));
            edges.push(centers[n - 1] + (centers[n - 1] - centers[n - 2]) / 2.0);
            edges
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::OverwritePolicy;
    use crate::processing::{DatasetAssembler, ProfileAccumulator, RunProvenance};
    use crate::registry::MomentCatalog;
    use crate::store::write_dataset;
    use crate::testing::{FakeScan, FakeToolkit};
    use chrono::TimeZone;

    fn stored_dataset(dir: &Path) -> PathBuf {
        let toolkit = FakeToolkit::new()
            .with_scan("a.nc", FakeScan::at(2018, 8, 31, 3))
            .with_scan("b.nc", FakeScan::at(2018, 8, 31, 9));
        let (sites, catalog) = (SiteRegistry::builtin(), MomentCatalog::builtin());
        let series = ProfileAccumulator::new(toolkit, &catalog, 20.0)
            .accumulate(&["a.nc", "b.nc"])
            .unwrap();
        let provenance = RunProvenance {
            command_line: "qvpdriver run".into(),
            created: Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap(),
            host: "testhost".into(),
        };
        let dataset = DatasetAssembler::new(&sites, &catalog)
            .assemble(&series, "xsaprqvpI5", &provenance)
            .unwrap();
        write_dataset(&dataset, dir, OverwritePolicy::Replace).unwrap()
    }

    fn plan_for(fields: &[&str], image_dir: &Path, dataset: &Path) -> QuicklookPlan {
        let (sites, registry) = (SiteRegistry::builtin(), FieldRegistry::builtin());
        let renderer = QuicklookRenderer::new(&sites, &registry);
        let specs: Vec<_> = fields.iter().map(|f| registry.get(f).unwrap()).collect();
        let dataset = QvpDataset::open(dataset).unwrap();
        renderer
            .plan(
                &dataset,
                fields,
                &specs,
                sites.get("xsaprqvpI5").unwrap(),
                image_dir,
            )
            .unwrap()
    }

    #[test]
    fn one_panel_spans_the_first_day() {
        let dir = tempfile::tempdir().unwrap();
        let path = stored_dataset(dir.path());
        let plan = plan_for(&["corrected_reflectivity"], dir.path(), &path);

        assert_eq!(
            plan.path.file_name().unwrap().to_str().unwrap(),
            "sgpxsaprqvpI5.c1.20180831.000000.png"
        );
        assert_eq!(
            plan.day_start,
            Utc.with_ymd_and_hms(2018, 8, 31, 0, 0, 0).unwrap()
        );
        assert_eq!(
            plan.day_end,
            Utc.with_ymd_and_hms(2018, 9, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            plan.title,
            "SGP X-SAPR I5 QVP Profile Corrected Reflectivity 20.0 degrees \
             2018-08-31 00:00-2018-09-01 00:00"
        );
        let panel = &plan.panels[0];
        assert_eq!(panel.limits, (-20.0, 64.0));
        assert_eq!(panel.time_edges, vec![0.0, 6.0, 12.0]);
        assert_eq!(panel.height_edges_km.len(), 6);
    }

    #[test]
    fn four_panels_keep_caller_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = stored_dataset(dir.path());
        let fields = ["velocity", "corrected_reflectivity", "spectrum_width", "cross_correlation_ratio"];
        let plan = plan_for(&fields, dir.path(), &path);

        let order: Vec<_> = plan.panels.iter().map(|p| p.field.as_str()).collect();
        assert_eq!(order, fields.to_vec());
        assert!(plan.title.starts_with("SGP X-SAPR I5 QVP Profile 20.0 degrees"));
        // no registry limits for velocity: hour 3 and hour 9 samples, top gate masked
        assert_eq!(plan.panels[0].limits, (30.0, 93.0));
        assert_eq!(plan.panels[3].limits, (0.0, 1.0));
    }

    #[test]
    fn undefined_names_fail_before_reading() {
        let (sites, fields) = (SiteRegistry::builtin(), FieldRegistry::builtin());
        let renderer = QuicklookRenderer::new(&sites, &fields);
        let missing = Path::new("/nonexistent/qvp.nc");
        let out = Path::new("/nonexistent");

        let err = renderer
            .render_one_panel(missing, "hail", "xsaprqvpI5", out)
            .unwrap_err();
        assert!(matches!(err, QvpError::UnknownMoment(_)));
        let err = renderer
            .render_four_panel(
                missing,
                ["velocity", "velocity", "velocity", "velocity"],
                "xsaprqvpI9",
                out,
            )
            .unwrap_err();
        assert!(matches!(err, QvpError::UnknownSite(_)));
    }

    #[test]
    fn edges_surround_centres() {
        assert_eq!(cell_edges(&[1.0, 2.0, 4.0], 0.5), vec![0.5, 1.5, 3.0, 5.0]);
        assert_eq!(cell_edges(&[3.0], 0.5), vec![2.75, 3.25]);
        assert!(cell_edges(&[], 0.5).is_empty());
    }

    /// Width and height from the PNG header chunk.
    fn png_size(path: &Path) -> (u32, u32) {
        let bytes = std::fs::read(path).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");
        let word = |at: usize| {
            u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        (word(16), word(20))
    }

    fn images_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".png"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn renders_write_one_image_per_day() {
        let data_dir = tempfile::tempdir().unwrap();
        let image_dir = tempfile::tempdir().unwrap();
        let path = stored_dataset(data_dir.path());
        let (sites, fields) = (SiteRegistry::builtin(), FieldRegistry::builtin());
        let renderer = QuicklookRenderer::new(&sites, &fields);

        let single = renderer
            .render_one_panel(&path, "corrected_reflectivity", "xsaprqvpI5", image_dir.path())
            .unwrap();
        assert_eq!(
            single,
            image_dir.path().join("sgpxsaprqvpI5.c1.20180831.000000.png")
        );
        assert_eq!(png_size(&single), (1100, 520));

        let stacked = renderer
            .render_four_panel(
                &path,
                ["velocity", "corrected_reflectivity", "spectrum_width", "cross_correlation_ratio"],
                "xsaprqvpI5",
                image_dir.path(),
            )
            .unwrap();
        assert_eq!(stacked, single);
        assert_eq!(
            images_in(image_dir.path()),
            vec!["sgpxsaprqvpI5.c1.20180831.000000.png".to_string()]
        );
        assert_eq!(png_size(&stacked), (1100, 1700));
    }
}
