use crate::prelude::{QvpError, QvpResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Display metadata for one moment in a quicklook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub title: String,
    pub colorbar_label: String,
    /// Lower colour limit; the data minimum when unset.
    #[serde(default)]
    pub vmin: Option<f64>,
    /// Upper colour limit; the data maximum when unset.
    #[serde(default)]
    pub vmax: Option<f64>,
}

impl FieldSpec {
    fn new(title: &str, colorbar_label: &str) -> Self {
        Self {
            title: title.to_string(),
            colorbar_label: colorbar_label.to_string(),
            vmin: None,
            vmax: None,
        }
    }

    fn limits(mut self, vmin: f64, vmax: f64) -> Self {
        self.vmin = Some(vmin);
        self.vmax = Some(vmax);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldRegistry {
    fields: BTreeMap<String, FieldSpec>,
}

impl FieldRegistry {
    pub fn new(fields: BTreeMap<String, FieldSpec>) -> Self {
        Self { fields }
    }

    pub fn builtin() -> Self {
        let entries = [
            (
                "total_power",
                FieldSpec::new("Reflectivity", "Mean Reflectivity Factor (dBZ)").limits(-20.0, 64.0),
            ),
            (
                "reflectivity",
                FieldSpec::new("Reflectivity", "Mean Reflectivity Factor (dBZ)").limits(-20.0, 64.0),
            ),
            (
                "velocity",
                FieldSpec::new("Doppler Velocity", "Mean Doppler Velocity (m/s)"),
            ),
            (
                "spectrum_width",
                FieldSpec::new("Doppler Spectrum Width", "Mean Doppler Spectrum Width (m/s)"),
            ),
            (
                "differential_reflectivity",
                FieldSpec::new(
                    "Differential Reflectivity",
                    "Mean Differential Reflectivity Factor (dB)",
                ),
            ),
            (
                "specific_differential_phase",
                FieldSpec::new(
                    "Specific Differential Phase",
                    "Mean Specific Differential Phase (deg/km)",
                ),
            ),
            (
                "cross_correlation_ratio",
                FieldSpec::new("Correlation Coefficient Ratio", "Mean Correlation Coefficient")
                    .limits(0.0, 1.0),
            ),
            (
                "normalized_coherent_power",
                FieldSpec::new("Normalized Coherent Power", "Mean Normalized Coherent Power"),
            ),
            (
                "differential_phase",
                FieldSpec::new("Differential Phase", "Mean Differential Phase (deg)"),
            ),
            (
                "xsapr_clutter",
                FieldSpec::new("X-SAPR Clutter", "Mean X-SAPR Clutter"),
            ),
            (
                "signal_to_noise_ratio",
                FieldSpec::new("Signal to Noise Ratio", "Mean Signal to Noise Ratio"),
            ),
            (
                "velocity_texture",
                FieldSpec::new(
                    "Doppler Velocity Texture",
                    "Mean Doppler Velocity Texture (m/s)",
                ),
            ),
            (
                "gate_id",
                FieldSpec::new(
                    "Classification of Dominant Scatter",
                    "Classification of Dominant Scatter",
                ),
            ),
            (
                "radar_echo_classification",
                FieldSpec::new("Radar Echo Classification", "Radar Echo Classification"),
            ),
            (
                "corrected_velocity",
                FieldSpec::new("Corrected Doppler Velocity", "Mean Doppler Velocity (m/s)"),
            ),
            (
                "unfolded_differential_phase",
                FieldSpec::new("Unfolded Differential Phase", "Mean Differential Phase (deg)"),
            ),
            (
                "corrected_differential_phase",
                FieldSpec::new(
                    "Corrected Differential Phase",
                    "Mean Differential Phase (deg)",
                ),
            ),
            (
                "filtered_corrected_differential_phase",
                FieldSpec::new(
                    "Filtered Corrected Differential Phase",
                    "Mean Differential Phase (deg)",
                ),
            ),
            (
                "corrected_specific_diff_phase",
                FieldSpec::new(
                    "Corrected Specific Differential Phase",
                    "Mean Specific Diff Phase (deg/km)",
                ),
            ),
            (
                "filtered_corrected_specific_diff_phase",
                FieldSpec::new(
                    "Filtered Corrected Specific Differential Phase",
                    "Mean Specific Diff Phase (deg/km)",
                ),
            ),
            (
                "corrected_differential_reflectivity",
                FieldSpec::new(
                    "Corrected Differential Reflectivity",
                    "Mean Differential Reflectivity Factor (dB)",
                ),
            ),
            (
                "corrected_reflectivity",
                FieldSpec::new("Corrected Reflectivity", "Mean Reflectivity Factor (dBZ)")
                    .limits(-20.0, 64.0),
            ),
            (
                "specific_attenuation",
                FieldSpec::new("Specific Attenuation", "Mean Specific Attenuation (dB/km)"),
            ),
            (
                "path_integrated_attenuation",
                FieldSpec::new(
                    "Path Integrated Attenuation",
                    "Mean Path Integrated Attenuation (dB)",
                ),
            ),
            (
                "specific_differential_attenuation",
                FieldSpec::new(
                    "Specific Differential Attenuation",
                    "Mean Specific Diff Attenuation (dB/km)",
                ),
            ),
            (
                "path_integrated_differential_attenuation",
                FieldSpec::new(
                    "Path Integrated Differential Attenuation",
                    "Mean Path Integrated Diff Attenuation (dB)",
                ),
            ),
            (
                "rain_rate_A",
                FieldSpec::new("Rainfall Rate", "Mean Rain Fall Rate (mm/hr)"),
            ),
        ];

        Self::new(
            entries
                .into_iter()
                .map(|(name, spec)| (name.to_string(), spec))
                .collect(),
        )
    }

    pub fn get(&self, name: &str) -> QvpResult<&FieldSpec> {
        self.fields
            .get(name)
            .ok_or_else(|| QvpError::UnknownMoment(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldSpec)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
