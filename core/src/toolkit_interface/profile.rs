use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameters passed to the external quasi vertical profile retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRequest {
    /// Elevation of the sweep to average, in degrees. The toolkit picks the
    /// nearest sweep when no exact match exists.
    pub elevation_deg: f64,
    /// Source field names to retrieve, or every field when `None`.
    pub fields: Option<Vec<String>>,
}

/// Azimuthally averaged profiles of one volume at one elevation.
///
/// Every vector in `fields` is indexed like `height`; masked gates are `NaN`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievedProfile {
    pub height: Vec<f64>,
    pub fields: BTreeMap<String, Vec<f32>>,
}

impl RetrievedProfile {
    pub fn new(height: Vec<f64>) -> Self {
        Self {
            height,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, values: Vec<f32>) -> Self {
        self.fields.insert(name.to_string(), values);
        self
    }

    pub fn field(&self, name: &str) -> Option<&[f32]> {
        self.fields.get(name).map(Vec::as_slice)
    }
}
