pub mod accumulator;
pub mod assembler;
pub mod series;

pub use accumulator::ProfileAccumulator;
pub use assembler::{AssembledDataset, DatasetAssembler, DatasetVariable, RunProvenance};
pub use series::{MomentColumn, Presence, ProfileSeries, ProfileStep};
