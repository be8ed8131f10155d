mod geometry;
mod insert_size;
mod stutter;

pub use geometry::{FragmentGeometry, Placements};
pub use insert_size::{InsertSizeModel, MIN_INSERT_SAMPLES};
pub use stutter::StutterModel;
