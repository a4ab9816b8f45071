pub mod map;
pub mod table;
pub mod text;

pub use map::{DEFAULT_CENTER, DEFAULT_ZOOM, MAX_ZOOM, MapPresenter, MapView, Marker, choose_center};
pub use table::LocationTable;
pub use text::TextPresenter;

use crate::domain::LocationCollection;

/// Turns the session's locations into output for one presentation surface
pub trait Render {
    fn render(&self, locations: &LocationCollection) -> String;
}
