mod plan;
mod profile;
mod snapshot;

pub use plan::*;
pub use profile::*;
pub use snapshot::*;
