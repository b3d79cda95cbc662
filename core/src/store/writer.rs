use crate::prelude::{OverwritePolicy, QvpError, QvpResult, FILL_VALUE};
use crate::processing::assembler::{AssembledDataset, DatasetVariable};
use crate::store::naming::DATASET_EXTENSION;
use crate::store::prepare_output;
use crate::toolkit_interface::SiteLocation;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

pub const TIME_DIM: &str = "time";
pub const HEIGHT_DIM: &str = "height";

const EPOCH_UNITS: &str = "seconds since 1970-1-1 0:00:00 0:00";

/// CF time units anchored at `base`.
pub fn time_units(base: DateTime<Utc>) -> String {
    format!("seconds since {} 0:00", base.format("%Y-%m-%d %H:%M:%S"))
}

/// Persist `dataset` as a netCDF file named after its datastream and day.
///
/// A single synchronous write: a failure part way leaves whatever the
/// library managed to flush. A dataset without time steps never replaces
/// an existing file.
pub fn write_dataset(
    dataset: &AssembledDataset,
    directory: &Path,
    policy: OverwritePolicy,
) -> QvpResult<PathBuf> {
    let base = dataset.times.first().copied().unwrap_or_default();
    let base_epoch =
        i32::try_from(base.timestamp()).map_err(|_| QvpError::TimeOutOfRange(base))?;

    let path = directory.join(dataset.file_name(DATASET_EXTENSION));
    let policy = if dataset.times.is_empty() {
        OverwritePolicy::Refuse
    } else {
        policy
    };
    prepare_output(&path, policy)?;

    let mut file = netcdf::create(&path)?;
    for (name, value) in &dataset.attributes {
        file.add_attribute(name, value.as_str())?;
    }
    file.add_unlimited_dimension(TIME_DIM)?;
    file.add_dimension(HEIGHT_DIM, dataset.height.len())?;

    write_time(&mut file, &dataset.times, base_epoch)?;
    write_height(&mut file, &dataset.height.to_vec())?;
    if let Some(location) = dataset.location {
        write_location(&mut file, location)?;
    }
    for variable in &dataset.variables {
        write_moment(&mut file, variable)?;
    }
    Ok(path)
}

fn write_time(
    file: &mut netcdf::FileMut,
    times: &[DateTime<Utc>],
    base_epoch: i32,
) -> QvpResult<()> {
    let base = times.first().copied().unwrap_or_default();
    let units = time_units(base);
    let offsets: Vec<f64> = times
        .iter()
        .map(|t| (*t - base).num_microseconds().unwrap_or(0) as f64 / 1e6)
        .collect();

    let mut base_time = file.add_variable::<i32>("base_time", &[])?;
    base_time.put_attribute(
        "string",
        base.format("%d-%b-%Y,%H:%M:%S GMT").to_string(),
    )?;
    base_time.put_attribute("units", EPOCH_UNITS)?;
    base_time.put_attribute("long_name", "Base time in Epoch")?;
    base_time.put_attribute("ancillary_variables", "time_offset")?;
    base_time.put_attribute("calendar", "gregorian")?;
    base_time.put_values(&[base_epoch], ..)?;

    let mut time_offset = file.add_variable::<f64>("time_offset", &[TIME_DIM])?;
    time_offset.put_attribute("long_name", "Time offset from base_time")?;
    time_offset.put_attribute("ancillary_variables", "base_time")?;
    time_offset.put_attribute("units", units.as_str())?;
    time_offset.put_attribute("calendar", "gregorian")?;
    if !offsets.is_empty() {
        time_offset.put_values(&offsets, (&[0usize], &[offsets.len()]))?;
    }

    let mut time = file.add_variable::<f64>("time", &[TIME_DIM])?;
    time.put_attribute("long_name", "Time offset from base_time")?;
    time.put_attribute("standard_name", "time")?;
    time.put_attribute("units", units.as_str())?;
    time.put_attribute("calendar", "gregorian")?;
    if !offsets.is_empty() {
        time.put_values(&offsets, (&[0usize], &[offsets.len()]))?;
    }
    Ok(())
}

fn write_height(file: &mut netcdf::FileMut, height: &[f64]) -> QvpResult<()> {
    let mut var = file.add_variable::<f64>("height", &[HEIGHT_DIM])?;
    var.put_attribute("standard_name", "height")?;
    var.put_attribute("units", "meters")?;
    var.put_attribute("long_name", "Height above ground")?;
    if !height.is_empty() {
        var.put_values(height, (&[0usize], &[height.len()]))?;
    }
    Ok(())
}

fn write_location(file: &mut netcdf::FileMut, location: SiteLocation) -> QvpResult<()> {
    let coordinates = [
        (
            "lon",
            location.longitude,
            "East longitude",
            "degree_E",
            "longitude",
            Some((-180.0, 180.0)),
        ),
        (
            "lat",
            location.latitude,
            "North latitude",
            "degree_N",
            "latitude",
            Some((-90.0, 90.0)),
        ),
        (
            "alt",
            location.altitude,
            "Altitude above mean sea level",
            "m",
            "altitude",
            None,
        ),
    ];

    for (name, value, long_name, units, standard_name, range) in coordinates {
        let mut var = file.add_variable::<f64>(name, &[])?;
        var.put_attribute("long_name", long_name)?;
        var.put_attribute("units", units)?;
        var.put_attribute("standard_name", standard_name)?;
        if let Some((min, max)) = range {
            var.put_attribute("valid_min", min)?;
            var.put_attribute("valid_max", max)?;
        }
        var.put_values(&[value], ..)?;
    }
    Ok(())
}

fn write_moment(file: &mut netcdf::FileMut, variable: &DatasetVariable) -> QvpResult<()> {
    let spec = &variable.spec;
    let mut var = file.add_variable::<f32>(&spec.name, &[TIME_DIM, HEIGHT_DIM])?;
    var.set_fill_value(FILL_VALUE)?;
    var.put_attribute("units", spec.units.as_str())?;
    var.put_attribute("long_name", spec.long_name.as_str())?;
    if let Some(standard_name) = &spec.standard_name {
        var.put_attribute("standard_name", standard_name.as_str())?;
    }
    if let Some((min, max)) = variable.valid_range {
        var.put_attribute("valid_min", min as f32)?;
        var.put_attribute("valid_max", max as f32)?;
    }
    if let Some(values) = &spec.flag_values {
        var.put_attribute("flag_values", values.as_str())?;
    }
    if let Some(meanings) = &spec.flag_meanings {
        var.put_attribute("flag_meanings", meanings.as_str())?;
    }
    if let Some(comment) = &spec.comment {
        var.put_attribute("comment", comment.as_str())?;
    }

    let (times, heights) = variable.data.dim();
    if times == 0 || heights == 0 {
        return Ok(());
    }
    let values: Vec<f32> = variable
        .data
        .iter()
        .map(|v| if v.is_finite() { *v } else { FILL_VALUE })
        .collect();
    var.put_values(&values, (&[0usize, 0], &[times, heights]))?;
    Ok(())
}
