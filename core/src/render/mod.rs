//! Quicklook images drawn from stored QVP datasets.

pub mod colormap;
pub mod quicklook;

pub use colormap::Colormap;
pub use quicklook::{Panel, QuicklookPlan, QuicklookRenderer};
