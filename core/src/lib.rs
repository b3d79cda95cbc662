//! Quasi vertical profile (QVP) production for scanning weather radars.
//!
//! Scans are reduced to azimuthally averaged height profiles by an external
//! radar toolkit, stacked into a time/height series, written as one netCDF
//! file per site and day, and rendered as quicklook images.

pub mod math;
pub mod prelude;
pub mod processing;
pub mod registry;
pub mod render;
pub mod store;
pub mod telemetry;
pub mod toolkit_interface;

#[cfg(test)]
mod testing;

pub use prelude::{OverwritePolicy, QvpError, QvpResult, FILL_VALUE};
pub use processing::{DatasetAssembler, ProfileAccumulator, ProfileSeries, RunProvenance};
pub use registry::{FieldRegistry, MomentCatalog, SiteRegistry};
pub use render::QuicklookRenderer;
pub use store::QvpDataset;
pub use toolkit_interface::{RadarToolkit, RadarVolume};
