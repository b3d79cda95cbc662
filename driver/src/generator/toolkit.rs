use crate::generator::scan::SyntheticScan;
use chrono::{DateTime, Utc};
use qvpcore::prelude::{QvpError, QvpResult};
use qvpcore::registry::MomentCatalog;
use qvpcore::toolkit_interface::{
    ProfileRequest, RadarToolkit, RadarVolume, RetrievedProfile, SiteLocation,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::fs;
use std::path::Path;

const CLASSIFICATION: &str = "radar_echo_classification";

impl RadarVolume for SyntheticScan {
    fn first_ray_time(&self) -> DateTime<Utc> {
        self.time
    }

    fn location(&self) -> SiteLocation {
        self.location
    }

    fn declares_field(&self, field: &str) -> bool {
        field != CLASSIFICATION || self.classification
    }
}

/// Reads JSON scan descriptors and fabricates plausible stratiform profiles.
///
/// Output is a pure function of the descriptor and the request.
pub struct SyntheticToolkit {
    sources: Vec<String>,
}

impl SyntheticToolkit {
    pub fn new(catalog: &MomentCatalog) -> Self {
        Self {
            sources: catalog.iter().map(|spec| spec.source.clone()).collect(),
        }
    }
}

impl RadarToolkit for SyntheticToolkit {
    type Volume = SyntheticScan;

    fn read(&self, path: &Path) -> QvpResult<SyntheticScan> {
        let unreadable = |reason: String| QvpError::UnreadableScan {
            path: path.to_path_buf(),
            reason,
        };
        let body = fs::read_to_string(path).map_err(|err| unreadable(err.to_string()))?;
        serde_json::from_str(&body).map_err(|err| unreadable(err.to_string()))
    }

    fn quasi_vertical_profile(
        &self,
        scan: &SyntheticScan,
        request: &ProfileRequest,
    ) -> QvpResult<RetrievedProfile> {
        if !(request.elevation_deg > 0.0 && request.elevation_deg <= 90.0) {
            return Err(QvpError::Retrieval(format!(
                "no sweep near {} degrees",
                request.elevation_deg
            )));
        }
        let sine = request.elevation_deg.to_radians().sin();
        let height: Vec<f64> = (0..scan.gates)
            .map(|gate| gate as f64 * scan.gate_spacing_m * sine)
            .collect();

        let sources = request.fields.as_ref().unwrap_or(&self.sources);
        let mut profile = RetrievedProfile::new(height.clone());
        for source in sources {
            if !scan.declares_field(source) {
                continue;
            }
            let mut rng = StdRng::seed_from_u64(scan.seed ^ field_salt(source));
            let values = height
                .iter()
                .map(|h| {
                    if *h > scan.echo_top_m {
                        f32::NAN
                    } else {
                        sample(source, *h, scan, &mut rng) as f32
                    }
                })
                .collect();
            profile = profile.with_field(source, values);
        }
        Ok(profile)
    }
}

fn field_salt(source: &str) -> u64 {
    source
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
        })
}

/// Category of the hydrometeors at `height_m`: 1 rain, 2 melting, 3 snow.
fn layer(height_m: f64, scan: &SyntheticScan) -> f64 {
    let offset = height_m - scan.melting_layer_m;
    if offset < -250.0 {
        1.0
    } else if offset <= 250.0 {
        2.0
    } else {
        3.0
    }
}

fn sample(source: &str, height_m: f64, scan: &SyntheticScan, rng: &mut StdRng) -> f64 {
    let km = height_m / 1000.0;
    let band = (-((height_m - scan.melting_layer_m) / 250.0).powi(2)).exp();
    let below = height_m < scan.melting_layer_m;
    let noise = rng.gen_range(-0.5..0.5);

    match source {
        "reflectivity" | "corrected_reflectivity" | "total_power" => {
            32.0 - 2.5 * km + 10.0 * band + noise
        }
        "mean_doppler_velocity" | "corrected_velocity" => {
            let fall = if below { -5.5 } else { -1.2 };
            fall - 2.0 * band + 0.1 * noise
        }
        "spectral_width" => 0.6 + 0.4 * band + 0.05 * noise,
        "differential_reflectivity" | "corrected_differential_reflectivity" => {
            (if below { 0.6 } else { 0.2 }) + 1.5 * band + 0.1 * noise
        }
        "cross_correlation_ratio_hv" => (0.99 - 0.08 * band + 0.005 * noise).min(1.0),
        "differential_phase"
        | "unfolded_differential_phase"
        | "corrected_differential_phase"
        | "filtered_corrected_differential_phase" => 40.0 + 3.0 * km + noise,
        "specific_differential_phase"
        | "corrected_specific_diff_phase"
        | "filtered_corrected_specific_diff_phase" => {
            (if below { 0.3 } else { 0.05 }) + 0.05 * noise
        }
        "normalized_coherent_power" => 0.8 + 0.05 * noise,
        "SNR" => 35.0 - 3.0 * km + noise,
        "velocity_texture" => 1.0 + 0.5 * band + 0.1 * noise,
        "gate_id" | CLASSIFICATION => layer(height_m, scan),
        "ground_clutter" => {
            if height_m < 200.0 {
                1.0
            } else {
                0.0
            }
        }
        "rain_rate_A" => {
            if below {
                2.0 + 0.2 * noise
            } else {
                0.0
            }
        }
        "specific_attenuation"
        | "path_integrated_attenuation"
        | "specific_differential_attenuation"
        | "path_integrated_differential_attenuation" => {
            if below {
                0.01 + 0.002 * noise
            } else {
                0.0
            }
        }
        _ => noise,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::scan::{write_day, DayPlan};
    use chrono::NaiveDate;

    fn plan() -> DayPlan {
        DayPlan {
            scans: 2,
            gates: 20,
            gate_spacing_m: 1000.0,
            ..Default::default()
        }
    }

    #[test]
    fn profile_is_deterministic_and_masked_above_echo_top() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_day(dir.path(), NaiveDate::from_ymd_opt(2018, 8, 31).unwrap(), &plan())
            .unwrap();
        let catalog = MomentCatalog::builtin();
        let toolkit = SyntheticToolkit::new(&catalog);
        let scan = toolkit.read(&paths[0]).unwrap();
        let request = ProfileRequest {
            elevation_deg: 90.0,
            fields: None,
        };

        let first = toolkit.quasi_vertical_profile(&scan, &request).unwrap();
        let second = toolkit.quasi_vertical_profile(&scan, &request).unwrap();
        let reflectivity = first.field("reflectivity").unwrap();
        assert_eq!(reflectivity.len(), 20);
        assert_eq!(
            reflectivity[..9],
            second.field("reflectivity").unwrap()[..9]
        );
        // echo top is 9 km for the first scan of the day
        assert!(reflectivity[10].is_nan());
        assert_eq!(first.fields.len(), catalog.len());
    }

    #[test]
    fn requested_fields_and_classification_flag() {
        let dir = tempfile::tempdir().unwrap();
        let no_class = DayPlan {
            classification: false,
            ..plan()
        };
        let paths =
            write_day(dir.path(), NaiveDate::from_ymd_opt(2018, 8, 31).unwrap(), &no_class)
                .unwrap();
        let toolkit = SyntheticToolkit::new(&MomentCatalog::builtin());
        let scan = toolkit.read(&paths[0]).unwrap();
        let request = ProfileRequest {
            elevation_deg: 20.0,
            fields: Some(vec!["SNR".into(), CLASSIFICATION.into()]),
        };

        let profile = toolkit.quasi_vertical_profile(&scan, &request).unwrap();
        assert!(profile.field("SNR").is_some());
        assert!(profile.field(CLASSIFICATION).is_none());
        assert!(!scan.declares_field(CLASSIFICATION));
    }

    #[test]
    fn garbage_files_are_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "not json").unwrap();
        let toolkit = SyntheticToolkit::new(&MomentCatalog::builtin());
        let err = toolkit.read(&path).unwrap_err();
        assert!(err.is_skippable());
        assert!(toolkit.read(&dir.path().join("missing.json")).unwrap_err().is_skippable());
    }

    #[test]
    fn impossible_elevation_is_a_retrieval_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_day(dir.path(), NaiveDate::from_ymd_opt(2018, 8, 31).unwrap(), &plan())
            .unwrap();
        let toolkit = SyntheticToolkit::new(&MomentCatalog::builtin());
        let scan = toolkit.read(&paths[0]).unwrap();
        let request = ProfileRequest {
            elevation_deg: -1.0,
            fields: None,
        };
        let err = toolkit.quasi_vertical_profile(&scan, &request).unwrap_err();
        assert!(matches!(err, QvpError::Retrieval(_)));
    }
}
