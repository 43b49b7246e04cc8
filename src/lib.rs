pub use makepad_widgets;
pub use makepad_widgets::*;

pub mod error;
pub mod geo;
pub mod geolocation;
pub mod map_view;
pub mod picker;
pub mod picker_view;
pub mod session;
pub mod state;
pub mod tiles;

pub use error::{GeolocationError, PickerError};
pub use geo::Coordinate;
pub use geolocation::{FixedPositionProvider, GeolocationProvider, IpGeolocationProvider};
pub use map_view::*;
pub use picker::{LocationPicker, PickerConfig};
pub use picker_view::*;
pub use state::{EditMode, PickerState};
pub use tiles::{TileLayer, OSM_ATTRIBUTION, OSM_TILE_TEMPLATE};

pub fn live_design(cx: &mut Cx) {
    crate::map_view::live_design(cx);
    crate::picker_view::live_design(cx);
}
