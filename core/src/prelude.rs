use std::path::PathBuf;

/// Sentinel written for masked or missing samples in every moment variable.
pub const FILL_VALUE: f32 = -9999.0;

/// Common error type for accumulation, assembly, persistence and rendering.
#[derive(thiserror::Error, Debug)]
pub enum QvpError {
    #[error("unreadable scan {path}: {reason}")]
    UnreadableScan { path: PathBuf, reason: String },
    #[error("unknown site identifier: {0}")]
    UnknownSite(String),
    #[error("unknown moment: {0}")]
    UnknownMoment(String),
    #[error("height bins of {path} differ from the first scan of the run")]
    HeightMismatch { path: PathBuf },
    #[error("moment {moment} has {found} samples per profile, expected {expected}")]
    ProfileLength {
        moment: String,
        expected: usize,
        found: usize,
    },
    #[error("moment {moment} is present in {present} of {total} time steps")]
    InconsistentSeries {
        moment: String,
        present: usize,
        total: usize,
    },
    #[error("retrieval failed: {0}")]
    Retrieval(String),
    #[error("base time {0} does not fit a 32-bit epoch")]
    TimeOutOfRange(chrono::DateTime<chrono::Utc>),
    #[error("output {0} already exists")]
    OutputExists(PathBuf),
    #[error("malformed dataset {path}: {reason}")]
    MalformedDataset { path: PathBuf, reason: String },
    #[error("rendering failed: {0}")]
    Render(String),
    #[error("netcdf error: {0}")]
    Netcdf(#[from] netcdf::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl QvpError {
    /// Errors the accumulator recovers from by skipping the offending file.
    pub fn is_skippable(&self) -> bool {
        matches!(self, QvpError::UnreadableScan { .. })
    }
}

pub type QvpResult<T> = Result<T, QvpError>;

/// What to do when a daily output file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverwritePolicy {
    /// Replace the existing file. Runs for the same site and day collide by name.
    #[default]
    Replace,
    /// Fail with [`QvpError::OutputExists`].
    Refuse,
}
