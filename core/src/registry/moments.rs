use crate::prelude::{QvpError, QvpResult};
use serde::{Deserialize, Serialize};

/// How the `valid_min` / `valid_max` attributes of a moment are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidRange {
    /// Physical bounds fixed per moment.
    Fixed { min: f64, max: f64 },
    /// Bounds taken from the unmasked extent of the assembled data.
    DataExtent,
}

/// Output variable description for one averaged radar moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentSpec {
    /// Variable name in the assembled dataset.
    pub name: String,
    /// Field name requested from, and returned by, the retrieval.
    pub source: String,
    pub units: String,
    pub long_name: String,
    #[serde(default)]
    pub standard_name: Option<String>,
    #[serde(default)]
    pub valid_range: Option<ValidRange>,
    #[serde(default)]
    pub flag_values: Option<String>,
    #[serde(default)]
    pub flag_meanings: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    /// Only recorded for scans whose source file declares the field.
    #[serde(default)]
    pub conditional: bool,
}

impl MomentSpec {
    pub fn new(name: &str, source: &str, units: &str, long_name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: source.to_string(),
            units: units.to_string(),
            long_name: long_name.to_string(),
            standard_name: None,
            valid_range: None,
            flag_values: None,
            flag_meanings: None,
            comment: None,
            conditional: false,
        }
    }

    pub fn standard_name(mut self, standard_name: &str) -> Self {
        self.standard_name = Some(standard_name.to_string());
        self
    }

    pub fn valid(mut self, min: f64, max: f64) -> Self {
        self.valid_range = Some(ValidRange::Fixed { min, max });
        self
    }

    pub fn valid_from_data(mut self) -> Self {
        self.valid_range = Some(ValidRange::DataExtent);
        self
    }

    pub fn flags(mut self, values: &str, meanings: &str) -> Self {
        self.flag_values = Some(values.to_string());
        self.flag_meanings = Some(meanings.to_string());
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    pub fn conditional(mut self) -> Self {
        self.conditional = true;
        self
    }
}

/// Ordered set of moments the accumulator records and the assembler writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MomentCatalog {
    moments: Vec<MomentSpec>,
}

const REFLECTIVITY_NAME: &str = "equivalent_reflectivity_factor";
const RADIAL_VELOCITY_NAME: &str = "radial_velocity_of_scatterers_away_from_instrument";

impl MomentCatalog {
    pub fn new(moments: Vec<MomentSpec>) -> Self {
        Self { moments }
    }

    /// Moments written by the X-SAPR QVP value-added product.
    pub fn builtin() -> Self {
        Self::new(vec![
            MomentSpec::new("total_power", "total_power", "dBZ", "Total power")
                .standard_name(REFLECTIVITY_NAME),
            MomentSpec::new("reflectivity", "reflectivity", "dBZ", "Reflectivity")
                .standard_name(REFLECTIVITY_NAME),
            MomentSpec::new("velocity", "mean_doppler_velocity", "m/s", "Mean doppler velocity")
                .standard_name(RADIAL_VELOCITY_NAME),
            MomentSpec::new("spectrum_width", "spectral_width", "m/s", "Doppler spectrum width"),
            MomentSpec::new(
                "differential_reflectivity",
                "differential_reflectivity",
                "dB",
                "Differential reflectivity",
            ),
            MomentSpec::new(
                "specific_differential_phase",
                "specific_differential_phase",
                "degree/km",
                "Specific differential phase (KDP)",
            ),
            MomentSpec::new(
                "cross_correlation_ratio",
                "cross_correlation_ratio_hv",
                "1",
                "Cross correlation ratio (RHOHV)",
            )
            .valid(0.0, 1.0),
            MomentSpec::new(
                "normalized_coherent_power",
                "normalized_coherent_power",
                "1",
                "Normalized coherent power",
            )
            .valid(0.0, 1.0)
            .comment("Also known as signal quality index (SQI)"),
            MomentSpec::new(
                "differential_phase",
                "differential_phase",
                "degree",
                "Differential phase (PhiDP)",
            )
            .valid(-180.0, 180.0),
            MomentSpec::new("xsapr_clutter", "ground_clutter", "1", "X-SAPR clutter")
                .flags("0, 1", "no_clutter, clutter"),
            MomentSpec::new("signal_to_noise_ratio", "SNR", "dB", "Signal to noise ratio"),
            MomentSpec::new(
                "velocity_texture",
                "velocity_texture",
                "m/s",
                "Mean doppler velocity texture",
            )
            .standard_name(RADIAL_VELOCITY_NAME),
            MomentSpec::new("gate_id", "gate_id", "1", "Classification of dominant scatter")
                .flags(
                    "0, 1, 2, 3, 4, 5",
                    "multi_trip, rain, snow, no_scatter, melting, clutter",
                )
                .valid(0.0, 5.0),
            MomentSpec::new(
                "radar_echo_classification",
                "radar_echo_classification",
                "1",
                "Radar echo classification",
            )
            .flags(
                "0, 1, 2, 3, 4, 5, 6, 255, 65535",
                "no_data_available, non_meteorological_target, rain, wet_snow, snow, \
                 graupel, hail, area_not_scanned, area_not_scanned",
            )
            .conditional(),
            MomentSpec::new(
                "corrected_velocity",
                "corrected_velocity",
                "m/s",
                "Corrected mean doppler velocity",
            )
            .standard_name(RADIAL_VELOCITY_NAME)
            .valid_from_data(),
            MomentSpec::new(
                "unfolded_differential_phase",
                "unfolded_differential_phase",
                "degree",
                "Unfolded differential phase (PhiDP)",
            )
            .valid(-180.0, 180.0),
            MomentSpec::new(
                "corrected_differential_phase",
                "corrected_differential_phase",
                "degree",
                "Corrected differential phase (PhiDP)",
            )
            .valid(0.0, 400.0),
            MomentSpec::new(
                "filtered_corrected_differential_phase",
                "filtered_corrected_differential_phase",
                "degree",
                "Filtered differential phase (PhiDP)",
            )
            .valid(0.0, 400.0),
            MomentSpec::new(
                "corrected_specific_diff_phase",
                "corrected_specific_diff_phase",
                "degree/km",
                "Corrected specific differential phase (KDP)",
            ),
            MomentSpec::new(
                "filtered_corrected_specific_diff_phase",
                "filtered_corrected_specific_diff_phase",
                "degree/km",
                "Filtered specific differential phase (KDP)",
            ),
            MomentSpec::new(
                "corrected_differential_reflectivity",
                "corrected_differential_reflectivity",
                "dB",
                "Corrected differential reflectivity",
            ),
            MomentSpec::new(
                "corrected_reflectivity",
                "corrected_reflectivity",
                "dBZ",
                "Corrected reflectivity",
            )
            .standard_name(REFLECTIVITY_NAME),
            MomentSpec::new(
                "specific_attenuation",
                "specific_attenuation",
                "dB/km",
                "Specific attenuation",
            )
            .valid(0.0, 1.0),
            MomentSpec::new(
                "path_integrated_attenuation",
                "path_integrated_attenuation",
                "dB",
                "Path integrated attenuation",
            ),
            MomentSpec::new(
                "specific_differential_attenuation",
                "specific_differential_attenuation",
                "dB/km",
                "Specific differential attenuation",
            ),
            MomentSpec::new(
                "path_integrated_differential_attenuation",
                "path_integrated_differential_attenuation",
                "dB",
                "Path integrated differential attenuation",
            ),
            MomentSpec::new("rain_rate_A", "rain_rate_A", "mm/hr", "Rainfall rate")
                .standard_name("rainfall_rate")
                .valid(0.0, 400.0)
                .comment(
                    "Rain rate calculated from specific_attenuation R=51.3*specific_attenuation**0.81, \
                     note R=0.0 where norm coherent power < 0.4 or rhohv < 0.8",
                ),
        ])
    }

    pub fn get(&self, name: &str) -> QvpResult<&MomentSpec> {
        self.moments
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| QvpError::UnknownMoment(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MomentSpec> {
        self.moments.iter()
    }

    pub fn len(&self) -> usize {
        self.moments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moments.is_empty()
    }

    /// Restrict the catalogue to `names`, keeping catalogue order.
    ///
    /// Fails on the first name that is not catalogued.
    pub fn subset<S: AsRef<str>>(&self, names: &[S]) -> QvpResult<MomentCatalog> {
        for name in names {
            self.get(name.as_ref())?;
        }
        let moments = self
            .moments
            .iter()
            .filter(|spec| names.iter().any(|n| n.as_ref() == spec.name))
            .cloned()
            .collect();
        Ok(MomentCatalog { moments })
    }
}

impl Default for MomentCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
