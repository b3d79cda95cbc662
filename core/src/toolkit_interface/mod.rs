pub mod profile;
pub mod volume;

pub use profile::{ProfileRequest, RetrievedProfile};
pub use volume::{RadarToolkit, RadarVolume, SiteLocation};
