use crate::prelude::QvpResult;
use crate::toolkit_interface::profile::{ProfileRequest, RetrievedProfile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Radar position reported by a volume scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SiteLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Metres above mean sea level.
    pub altitude: f64,
}

/// One radar volume opened by the toolkit.
pub trait RadarVolume {
    /// Time of the first ray in the volume.
    fn first_ray_time(&self) -> DateTime<Utc>;
    fn location(&self) -> SiteLocation;
    /// Whether the source file itself carries `field`.
    fn declares_field(&self, field: &str) -> bool;
}

/// External radar toolkit that reads volumes and performs the azimuthal averaging.
pub trait RadarToolkit {
    type Volume: RadarVolume;

    /// Open a scan file. Returning [`crate::QvpError::UnreadableScan`] makes the
    /// accumulator skip the file; any other error aborts the run.
    fn read(&self, path: &Path) -> QvpResult<Self::Volume>;

    fn quasi_vertical_profile(
        &self,
        volume: &Self::Volume,
        request: &ProfileRequest,
    ) -> QvpResult<RetrievedProfile>;
}
