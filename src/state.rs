use crate::geo::Coordinate;

/// Zoom used when the map is first mounted
pub const DEFAULT_ZOOM: f64 = 13.0;

/// Zoom used after a successful "get my location"
pub const LOCATE_ZOOM: f64 = 15.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditMode {
    /// Map navigable, marker fixed
    #[default]
    View,
    /// Map fixed, marker relocatable by click or drag
    Edit,
}

impl EditMode {
    pub fn is_edit(self) -> bool {
        self == EditMode::Edit
    }
}

/// Where the current coordinate came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CoordinateSource {
    #[default]
    Unset,
    FromDefault,
    FromGeolocation,
    Fallback,
    UserSelected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PopupLabel {
    /// Shown when the marker itself is clicked
    Current,
    Selected,
    YourLocation,
    Final,
}

impl PopupLabel {
    pub fn title(self) -> Option<&'static str> {
        match self {
            PopupLabel::Current => None,
            PopupLabel::Selected => Some("Selected Location"),
            PopupLabel::YourLocation => Some("Your Location"),
            PopupLabel::Final => Some("Final Location"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Popup {
    pub label: PopupLabel,
    pub at: Coordinate,
}

impl Popup {
    pub fn text(&self) -> String {
        match self.label.title() {
            Some(title) => format!("📍 {}\n{}", title, self.at),
            None => format!("📍 {}", self.at),
        }
    }
}

/// State owned by a single picker activation.
#[derive(Clone, Debug, PartialEq)]
pub struct PickerState {
    pub coordinate: Option<Coordinate>,
    pub edit_mode: EditMode,
    pub source: CoordinateSource,
    pub zoom: f64,
    /// Where the user panned the map to; `None` keeps it centered on the coordinate
    pub view_center: Option<Coordinate>,
    pub popup: Option<Popup>,
}

impl Default for PickerState {
    fn default() -> Self {
        Self {
            coordinate: None,
            edit_mode: EditMode::View,
            source: CoordinateSource::Unset,
            zoom: DEFAULT_ZOOM,
            view_center: None,
            popup: None,
        }
    }
}

impl PickerState {
    pub fn with_zoom(zoom: f64) -> Self {
        Self { zoom, ..Self::default() }
    }

    pub fn is_loading(&self) -> bool {
        self.coordinate.is_none()
    }

    /// Replace the coordinate and center the map on it; any open popup
    /// refers to the old point and is closed
    pub fn replace_coordinate(&mut self, at: Coordinate, source: CoordinateSource) {
        self.coordinate = Some(at);
        self.source = source;
        self.view_center = None;
        self.popup = None;
    }

    pub fn open_popup(&mut self, label: PopupLabel) {
        if let Some(at) = self.coordinate {
            self.popup = Some(Popup { label, at });
        }
    }
}
