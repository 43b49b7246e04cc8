//! Scoped ownership of a mounted map and its marker.
//!
//! A [`MapSession`] is built from a [`SessionSpec`] in one go and torn down as
//! a unit. Any change to what the picker shows produces a new spec, the old
//! session is dropped and a new one is mounted.

use crate::geo::Coordinate;
use crate::state::{EditMode, PickerState, Popup};
use crate::tiles::TileLayer;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerOptions {
    pub position: Coordinate,
    pub draggable: bool,
}

/// A freshly mounted map surface.
pub trait MapSurface {
    fn add_tile_layer(&mut self, layer: &TileLayer);
    fn add_marker(&mut self, marker: MarkerOptions);
    fn remove_marker(&mut self);
    fn bind_popup(&mut self, text: String);
    fn open_popup(&mut self);
    fn set_panning(&mut self, enabled: bool);
    fn set_scroll_zoom(&mut self, enabled: bool);
    fn set_double_click_zoom(&mut self, enabled: bool);
    fn set_marker_draggable(&mut self, draggable: bool);
    fn subscribe_clicks(&mut self);
    fn unsubscribe_clicks(&mut self);
    fn teardown(&mut self);
}

/// Something that can mount map surfaces.
pub trait MapRenderer {
    type Surface: MapSurface;

    fn mount(&mut self, center: Coordinate, zoom: f64) -> Self::Surface;
}

/// Everything a mounted session has to reflect.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSpec {
    /// Map center, which differs from the marker once the user has panned
    pub center: Coordinate,
    pub marker: Coordinate,
    pub zoom: f64,
    pub edit_mode: EditMode,
    pub layer: TileLayer,
    pub popup: Option<Popup>,
}

impl SessionSpec {
    /// `None` while the picker is still loading
    pub fn from_state(state: &PickerState, layer: &TileLayer) -> Option<Self> {
        let marker = state.coordinate?;
        Some(Self {
            center: state.view_center.unwrap_or(marker),
            marker,
            zoom: state.zoom,
            edit_mode: state.edit_mode,
            layer: layer.clone(),
            popup: state.popup,
        })
    }
}

pub struct MapSession<S: MapSurface> {
    surface: S,
    spec: SessionSpec,
}

impl<S: MapSurface> MapSession<S> {
    pub fn mount<R: MapRenderer<Surface = S>>(renderer: &mut R, spec: SessionSpec) -> Self {
        let mut surface = renderer.mount(spec.center, spec.zoom);
        surface.add_tile_layer(&spec.layer);

        let editing = spec.edit_mode.is_edit();
        surface.add_marker(MarkerOptions { position: spec.marker, draggable: editing });
        surface.set_marker_draggable(editing);
        surface.set_panning(!editing);
        surface.set_scroll_zoom(!editing);
        surface.set_double_click_zoom(!editing);
        surface.subscribe_clicks();

        if let Some(popup) = &spec.popup {
            surface.bind_popup(popup.text());
            surface.open_popup();
        }

        Self { surface, spec }
    }

    pub fn spec(&self) -> &SessionSpec {
        &self.spec
    }

    /// Record where the user moved this surface, so it is not mistaken for a
    /// change that needs a remount
    pub fn set_view(&mut self, center: Coordinate, zoom: f64) {
        self.spec.center = center;
        self.spec.zoom = zoom;
    }

    /// Bind and open a popup on the live surface
    pub fn show_popup(&mut self, popup: Popup) {
        self.surface.bind_popup(popup.text());
        self.surface.open_popup();
        self.spec.popup = Some(popup);
    }

    pub fn teardown(self) {
        drop(self)
    }
}

impl<S: MapSurface> Drop for MapSession<S> {
    fn drop(&mut self) {
        self.surface.unsubscribe_clicks();
        self.surface.remove_marker();
        self.surface.teardown();
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::state::PopupLabel;

    fn spec(edit_mode: EditMode) -> SessionSpec {
        SessionSpec {
            center: Coordinate::new(51.505, -0.09),
            marker: Coordinate::new(51.505, -0.09),
            zoom: 13.0,
            edit_mode,
            layer: TileLayer::default(),
            popup: None,
        }
    }

    #[test]
    fn view_mode_mount_enables_navigation() {
        let mut renderer = RecordingRenderer::default();
        let _session = MapSession::mount(&mut renderer, spec(EditMode::View));
        let calls = renderer.calls();
        assert_eq!(calls[0], Call::Mount(Coordinate::new(51.505, -0.09), 13.0));
        assert!(calls.contains(&Call::AddMarker(MarkerOptions {
            position: Coordinate::new(51.505, -0.09),
            draggable: false,
        })));
        assert!(calls.contains(&Call::Panning(true)));
        assert!(calls.contains(&Call::ScrollZoom(true)));
        assert!(calls.contains(&Call::DoubleClickZoom(true)));
        assert!(calls.contains(&Call::MarkerDraggable(false)));
        assert!(calls.contains(&Call::Subscribe));
    }

    #[test]
    fn edit_mode_mount_locks_navigation() {
        let mut renderer = RecordingRenderer::default();
        let _session = MapSession::mount(&mut renderer, spec(EditMode::Edit));
        let calls = renderer.calls();
        assert!(calls.contains(&Call::Panning(false)));
        assert!(calls.contains(&Call::ScrollZoom(false)));
        assert!(calls.contains(&Call::DoubleClickZoom(false)));
        assert!(calls.contains(&Call::MarkerDraggable(true)));
    }

    #[test]
    fn popup_is_reapplied_on_mount() {
        let mut renderer = RecordingRenderer::default();
        let mut s = spec(EditMode::Edit);
        s.popup = Some(Popup { label: PopupLabel::Selected, at: s.center });
        let _session = MapSession::mount(&mut renderer, s);
        assert_eq!(
            renderer.last_popup().as_deref(),
            Some("📍 Selected Location\nLat: 51.505, Lng: -0.09")
        );
        assert_eq!(renderer.calls().last(), Some(&Call::OpenPopup));
    }

    #[test]
    fn panned_spec_keeps_marker_in_place() {
        let mut renderer = RecordingRenderer::default();
        let mut s = spec(EditMode::View);
        s.center = Coordinate::new(40.0, 2.0);
        let _session = MapSession::mount(&mut renderer, s);
        let calls = renderer.calls();
        assert_eq!(calls[0], Call::Mount(Coordinate::new(40.0, 2.0), 13.0));
        assert!(calls.contains(&Call::AddMarker(MarkerOptions {
            position: Coordinate::new(51.505, -0.09),
            draggable: false,
        })));
    }

    #[test]
    fn popup_on_live_session_does_not_remount() {
        let mut renderer = RecordingRenderer::default();
        let mut session = MapSession::mount(&mut renderer, spec(EditMode::View));
        renderer.clear();
        let popup = Popup { label: PopupLabel::Current, at: session.spec().marker };
        session.show_popup(popup);
        assert_eq!(
            renderer.calls(),
            vec![Call::BindPopup("📍 Lat: 51.505, Lng: -0.09".into()), Call::OpenPopup]
        );
        assert_eq!(session.spec().popup, Some(popup));
    }

    #[test]
    fn drop_tears_down_once() {
        let mut renderer = RecordingRenderer::default();
        let session = MapSession::mount(&mut renderer, spec(EditMode::View));
        renderer.clear();
        session.teardown();
        assert_eq!(renderer.calls(), vec![Call::Unsubscribe, Call::RemoveMarker, Call::Teardown]);
    }

    #[test]
    fn loading_state_has_no_spec() {
        let state = PickerState::default();
        assert!(SessionSpec::from_state(&state, &TileLayer::default()).is_none());
    }
}
