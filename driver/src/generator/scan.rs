use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use qvpcore::toolkit_interface::SiteLocation;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// JSON stand-in for a radar volume file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticScan {
    pub time: DateTime<Utc>,
    pub location: SiteLocation,
    pub gates: usize,
    /// Slant range between gates, metres.
    pub gate_spacing_m: f64,
    /// Height of the melting layer bright band, metres above the radar.
    pub melting_layer_m: f64,
    /// Echo top; gates above it are masked.
    pub echo_top_m: f64,
    pub seed: u64,
    /// Whether the file carries `radar_echo_classification`.
    pub classification: bool,
}

/// Knobs for a day of synthetic scans.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DayPlan {
    pub scans: usize,
    pub interval_minutes: i64,
    pub gates: usize,
    pub gate_spacing_m: f64,
    pub seed: u64,
    pub classification: bool,
    pub location: SiteLocation,
}

impl Default for DayPlan {
    fn default() -> Self {
        Self {
            scans: 24,
            interval_minutes: 60,
            gates: 160,
            gate_spacing_m: 100.0,
            seed: 0,
            classification: true,
            location: SiteLocation {
                latitude: 36.491178,
                longitude: -97.593936,
                altitude: 330.0,
            },
        }
    }
}

impl DayPlan {
    /// Scans for `date`, starting at midnight. The melting layer drifts over the day.
    pub fn scans_for(&self, date: NaiveDate) -> Vec<SyntheticScan> {
        let midnight = DateTime::from_naive_utc_and_offset(
            date.and_hms_opt(0, 0, 0).unwrap_or_default(),
            Utc,
        );
        (0..self.scans)
            .map(|index| {
                let phase = index as f64 / self.scans.max(1) as f64;
                SyntheticScan {
                    time: midnight + Duration::minutes(self.interval_minutes * index as i64),
                    location: self.location,
                    gates: self.gates,
                    gate_spacing_m: self.gate_spacing_m,
                    melting_layer_m: 3000.0 + 800.0 * (phase * std::f64::consts::TAU).sin(),
                    echo_top_m: 9000.0 - 2000.0 * phase,
                    seed: self.seed.wrapping_add(index as u64),
                    classification: self.classification,
                }
            })
            .collect()
    }
}

pub fn scan_file_name(scan: &SyntheticScan) -> String {
    format!("xsapr.{}.json", scan.time.format("%Y%m%d.%H%M%S"))
}

/// Write one descriptor per scan into `dir`, returning the paths in time order.
pub fn write_day(dir: &Path, date: NaiveDate, plan: &DayPlan) -> anyhow::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let mut paths = Vec::with_capacity(plan.scans);
    for scan in plan.scans_for(date) {
        let path = dir.join(scan_file_name(&scan));
        let body = serde_json::to_string_pretty(&scan).context("encoding synthetic scan")?;
        fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
        paths.push(path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_plan_spaces_scans_from_midnight() {
        let plan = DayPlan {
            scans: 3,
            interval_minutes: 30,
            ..Default::default()
        };
        let scans = plan.scans_for(NaiveDate::from_ymd_opt(2018, 8, 31).unwrap());
        assert_eq!(scans.len(), 3);
        assert_eq!(scan_file_name(&scans[0]), "xsapr.20180831.000000.json");
        assert_eq!(scan_file_name(&scans[2]), "xsapr.20180831.010000.json");
        assert_ne!(scans[0].seed, scans[1].seed);
    }

    #[test]
    fn write_day_emits_readable_descriptors() {
        let dir = tempfile::tempdir().unwrap();
        let plan = DayPlan {
            scans: 2,
            ..Default::default()
        };
        let date = NaiveDate::from_ymd_opt(2017, 10, 5).unwrap();
        let paths = write_day(dir.path(), date, &plan).unwrap();
        assert_eq!(paths.len(), 2);

        let scan: SyntheticScan =
            serde_json::from_str(&fs::read_to_string(&paths[1]).unwrap()).unwrap();
        let expected = &plan.scans_for(date)[1];
        assert_eq!(scan.time, expected.time);
        assert_eq!(scan.gates, expected.gates);
        assert_eq!(scan.seed, expected.seed);
    }
}
