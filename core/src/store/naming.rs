use chrono::NaiveDate;

pub const DATASET_EXTENSION: &str = "nc";
pub const IMAGE_EXTENSION: &str = "png";

/// `<datastream>.<YYYYMMDD>.000000.<extension>`
///
/// Only the calendar day enters the name, so every run for the same
/// datastream and day maps to the same file.
pub fn daily_file_name(datastream: &str, date: NaiveDate, extension: &str) -> String {
    format!(
        "{}.{}.000000.{}",
        datastream,
        date.format("%Y%m%d"),
        extension
    )
}
