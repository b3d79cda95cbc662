use crate::prelude::{QvpError, QvpResult, FILL_VALUE};
use crate::store::writer::{HEIGHT_DIM, TIME_DIM};
use crate::toolkit_interface::SiteLocation;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A QVP dataset loaded back from disk, masked samples as NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct QvpDataset {
    path: PathBuf,
    pub times: Vec<DateTime<Utc>>,
    pub height: Array1<f64>,
    pub location: Option<SiteLocation>,
    pub variables: BTreeMap<String, Array2<f32>>,
    pub attributes: BTreeMap<String, String>,
}

impl QvpDataset {
    pub fn open(path: &Path) -> QvpResult<Self> {
        let malformed = |reason: &str| QvpError::MalformedDataset {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };
        let file = netcdf::open(path)?;

        let time = file
            .variable("time")
            .ok_or_else(|| malformed("no time variable"))?;
        let units = string_attribute(&time, "units").ok_or_else(|| malformed("time has no units"))?;
        let base = parse_time_units(&units)
            .ok_or_else(|| malformed(&format!("unrecognised time units '{}'", units)))?;
        let offsets: Vec<f64> = time.get_values::<f64, _>(..)?;
        let times: Vec<DateTime<Utc>> = offsets
            .iter()
            .map(|seconds| base + Duration::microseconds((seconds * 1e6).round() as i64))
            .collect();

        let height: Vec<f64> = match file.variable("height") {
            Some(var) if !times.is_empty() => var.get_values::<f64, _>(..)?,
            Some(_) => Vec::new(),
            None => return Err(malformed("no height variable")),
        };

        let location = match (
            scalar(&file, "lat")?,
            scalar(&file, "lon")?,
            scalar(&file, "alt")?,
        ) {
            (Some(latitude), Some(longitude), Some(altitude)) => Some(SiteLocation {
                latitude,
                longitude,
                altitude,
            }),
            _ => None,
        };

        let mut variables = BTreeMap::new();
        for var in file.variables() {
            let dims: Vec<String> = var.dimensions().iter().map(|dim| dim.name()).collect();
            if dims != [TIME_DIM, HEIGHT_DIM] {
                continue;
            }
            let values: Vec<f32> = if times.is_empty() || height.is_empty() {
                Vec::new()
            } else {
                var.get_values::<f32, _>(..)?
                    .into_iter()
                    .map(|v| if v == FILL_VALUE { f32::NAN } else { v })
                    .collect()
            };
            let data = Array2::from_shape_vec((times.len(), height.len()), values)
                .map_err(|err| malformed(&format!("{}: {}", var.name(), err)))?;
            variables.insert(var.name().to_string(), data);
        }

        let mut attributes = BTreeMap::new();
        for attr in file.attributes() {
            if let Ok(netcdf::AttributeValue::Str(value)) = attr.value() {
                attributes.insert(attr.name().to_string(), value);
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            times,
            height: Array1::from(height),
            location,
            variables,
            attributes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn variable(&self, name: &str) -> QvpResult<&Array2<f32>> {
        self.variables
            .get(name)
            .ok_or_else(|| QvpError::UnknownMoment(name.to_string()))
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// UTC day of the first sample.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.times.first().map(|t| t.date_naive())
    }
}

fn string_attribute(var: &netcdf::Variable, name: &str) -> Option<String> {
    match var.attribute(name)?.value().ok()? {
        netcdf::AttributeValue::Str(value) => Some(value),
        _ => None,
    }
}

fn scalar(file: &netcdf::File, name: &str) -> QvpResult<Option<f64>> {
    match file.variable(name) {
        Some(var) => Ok(var.get_values::<f64, _>(..)?.first().copied()),
        None => Ok(None),
    }
}

/// Parse `seconds since YYYY-MM-DD HH:MM:SS[ 0:00]`.
pub fn parse_time_units(units: &str) -> Option<DateTime<Utc>> {
    let stamp = units.strip_prefix("seconds since ")?.trim();
    let stamp = stamp.strip_suffix(" 0:00").unwrap_or(stamp);
    let naive = NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S").ok()?;
    Some(Utc.from_utc_datetime(&naive))
}
