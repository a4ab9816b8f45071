pub mod collection;
pub mod location;

pub use collection::LocationCollection;
pub use location::{LocationError, ResolvedLocation, check_coordinates};
