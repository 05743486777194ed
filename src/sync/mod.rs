//! Dataset synchronization: staleness check, archive download and extraction,
//! and persistence of the dataset/version pair.

mod archive;
mod synchronizer;

pub use archive::*;
pub use synchronizer::*;
