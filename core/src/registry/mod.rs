pub mod fields;
pub mod moments;
pub mod sites;

pub use fields::{FieldRegistry, FieldSpec};
pub use moments::{MomentCatalog, MomentSpec, ValidRange};
pub use sites::{PlotLabels, SiteProfile, SiteRegistry};
