pub mod scan;
pub mod toolkit;
