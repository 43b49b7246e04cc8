use crate::error::{GeolocationError, PickerError, Result};
use crate::geo::Coordinate;
use crate::geolocation::{PositionOptions, PositionReply, PositionTicket, RequestPurpose, RequestSequence};
use crate::session::{MapRenderer, MapSession, SessionSpec};
use crate::state::{CoordinateSource, EditMode, PickerState, PopupLabel, DEFAULT_ZOOM, LOCATE_ZOOM};
use crate::tiles::TileLayer;

pub const LOCATE_FAILED_ALERT: &str = "Failed to get location. Try enabling GPS.";

#[derive(Clone, Debug, PartialEq)]
pub struct PickerConfig {
    /// Takes precedence over geolocation at startup
    pub default_location: Option<Coordinate>,
    pub initial_zoom: f64,
    pub locate_zoom: f64,
    pub tile_layer: TileLayer,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            default_location: None,
            initial_zoom: DEFAULT_ZOOM,
            locate_zoom: LOCATE_ZOOM,
            tile_layer: TileLayer::default(),
        }
    }
}

/// A position query the host must hand to its geolocation provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PositionRequest {
    pub ticket: PositionTicket,
    pub options: PositionOptions,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PositionOutcome {
    Applied(Coordinate),
    /// Startup lookup failed, the fallback coordinate is in use
    FellBack(GeolocationError),
    /// Explicit lookup failed, the user has to be told
    Alert(GeolocationError),
    /// A newer request was issued since, the reply was dropped
    Stale,
}

/// The location picker interaction state machine.
///
/// Every operation runs to completion and then resynchronizes the mounted map
/// so that it shows the current coordinate, mode, zoom and popup.
pub struct LocationPicker<R: MapRenderer> {
    config: PickerConfig,
    state: PickerState,
    requests: RequestSequence,
    activated: bool,
    alert: Option<String>,
    renderer: R,
    session: Option<MapSession<R::Surface>>,
}

impl<R: MapRenderer> LocationPicker<R> {
    pub fn new(renderer: R, config: PickerConfig) -> Self {
        Self {
            state: PickerState::with_zoom(config.initial_zoom),
            config,
            requests: RequestSequence::default(),
            activated: false,
            alert: None,
            renderer,
            session: None,
        }
    }

    pub fn state(&self) -> &PickerState {
        &self.state
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.state.coordinate
    }

    pub fn edit_mode(&self) -> EditMode {
        self.state.edit_mode
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn session(&self) -> Option<&MapSession<R::Surface>> {
        self.session.as_ref()
    }

    /// First activation. Returns the startup position request when no default
    /// location was configured; later calls do nothing.
    pub fn activate(&mut self) -> Option<PositionRequest> {
        if self.activated {
            return None;
        }
        self.activated = true;

        if let Some(default) = self.config.default_location {
            self.state.replace_coordinate(default, CoordinateSource::FromDefault);
            self.resync(false);
            return None;
        }
        Some(PositionRequest {
            ticket: self.requests.issue(RequestPurpose::Initial),
            options: PositionOptions::default(),
        })
    }

    pub fn on_position(&mut self, reply: PositionReply) -> PositionOutcome {
        if !self.requests.is_current(&reply.ticket) {
            log::debug!("dropping stale position reply #{} (latest #{})", reply.ticket.seq, self.requests.latest());
            return PositionOutcome::Stale;
        }

        let outcome = match (reply.ticket.purpose, reply.result) {
            (RequestPurpose::Initial, Ok(at)) => {
                self.state.replace_coordinate(at, CoordinateSource::FromGeolocation);
                PositionOutcome::Applied(at)
            }
            (RequestPurpose::Initial, Err(error)) => {
                log::warn!("geolocation request denied: {}", error);
                self.state.replace_coordinate(Coordinate::FALLBACK, CoordinateSource::Fallback);
                PositionOutcome::FellBack(error)
            }
            (RequestPurpose::Locate, Ok(at)) => {
                self.state.replace_coordinate(at, CoordinateSource::FromGeolocation);
                self.state.zoom = self.config.locate_zoom;
                self.state.open_popup(PopupLabel::YourLocation);
                PositionOutcome::Applied(at)
            }
            (RequestPurpose::Locate, Err(error)) => {
                log::info!("explicit location request failed: {}", error);
                self.alert = Some(LOCATE_FAILED_ALERT.to_string());
                if self.state.is_loading() {
                    self.state.replace_coordinate(Coordinate::FALLBACK, CoordinateSource::Fallback);
                }
                PositionOutcome::Alert(error)
            }
        };

        let refresh = matches!(
            (&outcome, reply.ticket.purpose),
            (PositionOutcome::Applied(_), RequestPurpose::Locate)
        );
        self.resync(refresh);
        outcome
    }

    /// Switch from view to edit mode. Returns false when already editing or
    /// still loading.
    pub fn enter_edit_mode(&mut self) -> bool {
        if self.state.is_loading() || self.state.edit_mode.is_edit() {
            return false;
        }
        self.state.edit_mode = EditMode::Edit;
        self.resync(false);
        true
    }

    /// Hand the chosen coordinate to the host and go back to view mode.
    pub fn save(&mut self, on_save: &mut dyn FnMut(Coordinate)) -> Result<Coordinate> {
        let at = self.state.coordinate.ok_or(PickerError::SaveWithoutCoordinate)?;
        if !self.state.edit_mode.is_edit() {
            return Err(PickerError::NotEditing);
        }
        on_save(at);
        self.state.edit_mode = EditMode::View;
        self.state.open_popup(PopupLabel::Final);
        self.resync(false);
        Ok(at)
    }

    /// Start an explicit high-accuracy lookup, superseding any pending one.
    pub fn request_current_location(&mut self) -> PositionRequest {
        PositionRequest {
            ticket: self.requests.issue(RequestPurpose::Locate),
            options: PositionOptions::high_accuracy(),
        }
    }

    /// Click on the map surface. Only relocates in edit mode.
    pub fn map_clicked(&mut self, at: Coordinate) -> bool {
        self.select(at)
    }

    /// Marker dropped after a drag. Only relocates in edit mode.
    pub fn marker_dragged(&mut self, to: Coordinate) -> bool {
        self.select(to)
    }

    fn select(&mut self, at: Coordinate) -> bool {
        if !self.state.edit_mode.is_edit() || self.state.is_loading() {
            return false;
        }
        self.state.replace_coordinate(at.normalized(), CoordinateSource::UserSelected);
        self.state.open_popup(PopupLabel::Selected);
        self.resync(false);
        true
    }

    /// The marker shows its current coordinate when clicked, in either mode.
    /// The popup opens on the live map, which keeps wherever the user panned to.
    pub fn marker_clicked(&mut self) {
        if self.state.is_loading() {
            return;
        }
        self.state.open_popup(PopupLabel::Current);
        let Some(popup) = self.state.popup else {
            return;
        };
        match self.session.as_mut() {
            Some(session) => session.show_popup(popup),
            None => self.resync(false),
        }
    }

    /// The user panned or zoomed the map; later remounts keep that view.
    pub fn region_changed(&mut self, center: Coordinate, zoom: f64) {
        if self.state.is_loading() {
            return;
        }
        self.state.view_center = Some(center);
        self.state.zoom = zoom;
        if let Some(session) = &mut self.session {
            session.set_view(center, zoom);
        }
    }

    /// Changing the default re-initializes the coordinate from it and drops
    /// any pending lookup. `None` or an unchanged value does nothing.
    pub fn set_default_location(&mut self, default: Option<Coordinate>) {
        let Some(at) = default else {
            return;
        };
        if self.config.default_location == Some(at) {
            return;
        }
        self.config.default_location = Some(at);
        if !self.activated {
            return;
        }
        self.requests.invalidate();
        self.state.replace_coordinate(at, CoordinateSource::FromDefault);
        self.resync(false);
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Tear the map down, e.g. when the hosting widget goes away.
    pub fn unmount(&mut self) {
        self.session = None;
    }

    fn resync(&mut self, force: bool) {
        let Some(spec) = SessionSpec::from_state(&self.state, &self.config.tile_layer) else {
            self.session = None;
            return;
        };
        if !force && self.session.as_ref().map(|s| s.spec()) == Some(&spec) {
            return;
        }
        log::debug!("remounting map at {} ({:?})", spec.center, spec.edit_mode);
        // the old session must be gone before the new one mounts
        self.session = None;
        self.session = Some(MapSession::mount(&mut self.renderer, spec));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::{Call, RecordingRenderer};
    use crate::session::MarkerOptions;

    fn picker(default_location: Option<Coordinate>) -> (LocationPicker<RecordingRenderer>, RecordingRenderer) {
        let renderer = RecordingRenderer::default();
        let config = PickerConfig { default_location, ..PickerConfig::default() };
        (LocationPicker::new(renderer.clone(), config), renderer)
    }

    fn reply(request: PositionRequest, result: std::result::Result<Coordinate, GeolocationError>) -> PositionReply {
        PositionReply { ticket: request.ticket, result }
    }

    fn loaded(at: Coordinate) -> (LocationPicker<RecordingRenderer>, RecordingRenderer) {
        let (mut p, r) = picker(Some(at));
        assert!(p.activate().is_none());
        (p, r)
    }

    #[test]
    fn default_location_skips_geolocation() {
        let at = Coordinate::new(51.505, -0.09);
        let (mut p, r) = picker(Some(at));
        assert!(p.activate().is_none());
        assert_eq!(p.coordinate(), Some(at));
        assert_eq!(p.state().source, CoordinateSource::FromDefault);
        assert_eq!(r.calls()[0], Call::Mount(at, DEFAULT_ZOOM));
    }

    #[test]
    fn loading_until_geolocation_answers() {
        let (mut p, r) = picker(None);
        let request = p.activate().expect("startup request");
        assert_eq!(request.ticket.purpose, RequestPurpose::Initial);
        assert!(!request.options.high_accuracy);
        assert!(p.is_loading());
        assert_eq!(r.mounts(), 0);

        let at = Coordinate::new(48.85, 2.35);
        assert_eq!(p.on_position(reply(request, Ok(at))), PositionOutcome::Applied(at));
        assert_eq!(p.coordinate(), Some(at));
        assert_eq!(r.mounts(), 1);
    }

    #[test]
    fn activation_happens_once() {
        let (mut p, _) = picker(None);
        assert!(p.activate().is_some());
        assert!(p.activate().is_none());
    }

    #[test]
    fn startup_failure_falls_back_to_origin() {
        let (mut p, _) = picker(None);
        let request = p.activate().expect("startup request");
        let outcome = p.on_position(reply(request, Err(GeolocationError::PermissionDenied)));
        assert_eq!(outcome, PositionOutcome::FellBack(GeolocationError::PermissionDenied));
        assert_eq!(p.coordinate(), Some(Coordinate::FALLBACK));
        assert_eq!(p.state().source, CoordinateSource::Fallback);
        assert!(p.alert().is_none());
    }

    #[test]
    fn edit_mode_locks_map_and_frees_marker() {
        let (mut p, r) = loaded(Coordinate::new(1.0, 2.0));
        r.clear();
        assert!(p.enter_edit_mode());
        assert_eq!(p.edit_mode(), EditMode::Edit);
        let calls = r.calls();
        assert!(calls.contains(&Call::Teardown));
        assert!(calls.contains(&Call::MarkerDraggable(true)));
        assert!(calls.contains(&Call::Panning(false)));
        assert!(calls.contains(&Call::ScrollZoom(false)));
        assert!(calls.contains(&Call::DoubleClickZoom(false)));
        assert!(!p.enter_edit_mode());

        r.clear();
        p.save(&mut |_| {}).expect("save");
        let calls = r.calls();
        assert!(calls.contains(&Call::MarkerDraggable(false)));
        assert!(calls.contains(&Call::Panning(true)));
        assert!(calls.contains(&Call::ScrollZoom(true)));
        assert!(calls.contains(&Call::DoubleClickZoom(true)));
    }

    #[test]
    fn old_session_is_torn_down_before_remount() {
        let (mut p, r) = loaded(Coordinate::new(1.0, 2.0));
        r.clear();
        p.enter_edit_mode();
        let calls = r.calls();
        let teardown = calls.iter().position(|c| *c == Call::Teardown).expect("teardown");
        let mount = calls.iter().position(|c| matches!(c, Call::Mount(..))).expect("mount");
        assert!(teardown < mount);
    }

    #[test]
    fn click_relocates_only_in_edit_mode() {
        let start = Coordinate::new(1.0, 2.0);
        let (mut p, r) = loaded(start);
        let target = Coordinate::new(10.25, -20.5);

        assert!(!p.map_clicked(target));
        assert_eq!(p.coordinate(), Some(start));

        p.enter_edit_mode();
        assert!(p.map_clicked(target));
        assert_eq!(p.coordinate(), Some(target));
        assert_eq!(p.state().source, CoordinateSource::UserSelected);
        let popup = r.last_popup().expect("popup");
        assert!(popup.contains("Selected Location"));
        assert!(popup.contains("10.25") && popup.contains("-20.5"));
        assert!(r.calls().contains(&Call::AddMarker(MarkerOptions { position: target, draggable: true })));
    }

    #[test]
    fn drag_relocates_only_in_edit_mode() {
        let start = Coordinate::new(1.0, 2.0);
        let (mut p, _) = loaded(start);
        assert!(!p.marker_dragged(Coordinate::new(3.0, 4.0)));
        p.enter_edit_mode();
        assert!(p.marker_dragged(Coordinate::new(3.0, 4.0)));
        assert_eq!(p.coordinate(), Some(Coordinate::new(3.0, 4.0)));
    }

    #[test]
    fn save_calls_host_once_and_leaves_edit_mode() {
        let (mut p, r) = loaded(Coordinate::new(1.0, 2.0));
        p.enter_edit_mode();
        p.map_clicked(Coordinate::new(5.0, 6.0));

        let mut saved = Vec::new();
        let result = p.save(&mut |at| saved.push(at));
        assert_eq!(result, Ok(Coordinate::new(5.0, 6.0)));
        assert_eq!(saved, vec![Coordinate::new(5.0, 6.0)]);
        assert_eq!(p.edit_mode(), EditMode::View);
        assert!(r.last_popup().expect("popup").contains("Final Location"));
    }

    #[test]
    fn save_outside_edit_mode_is_rejected() {
        let (mut p, _) = loaded(Coordinate::new(1.0, 2.0));
        let mut calls = 0;
        assert_eq!(p.save(&mut |_| calls += 1), Err(PickerError::NotEditing));
        assert_eq!(calls, 0);
    }

    #[test]
    fn save_while_loading_is_rejected() {
        let (mut p, _) = picker(None);
        p.activate();
        let mut calls = 0;
        assert_eq!(p.save(&mut |_| calls += 1), Err(PickerError::SaveWithoutCoordinate));
        assert_eq!(calls, 0);
    }

    #[test]
    fn locate_works_in_view_mode_and_zooms_in() {
        let (mut p, r) = loaded(Coordinate::new(1.0, 2.0));
        let request = p.request_current_location();
        assert!(request.options.high_accuracy);
        let at = Coordinate::new(40.0, -3.5);
        assert_eq!(p.on_position(reply(request, Ok(at))), PositionOutcome::Applied(at));
        assert_eq!(p.coordinate(), Some(at));
        assert_eq!(p.edit_mode(), EditMode::View);
        assert_eq!(p.state().zoom, LOCATE_ZOOM);
        assert!(r.calls().contains(&Call::Mount(at, LOCATE_ZOOM)));
        assert!(r.last_popup().expect("popup").contains("Your Location"));
    }

    #[test]
    fn locate_failure_alerts_without_state_change() {
        let start = Coordinate::new(1.0, 2.0);
        let (mut p, _) = loaded(start);
        p.enter_edit_mode();
        let before = p.state().clone();
        let request = p.request_current_location();
        let outcome = p.on_position(reply(request, Err(GeolocationError::Timeout)));
        assert_eq!(outcome, PositionOutcome::Alert(GeolocationError::Timeout));
        assert_eq!(p.state(), &before);
        assert_eq!(p.alert(), Some(LOCATE_FAILED_ALERT));
        p.dismiss_alert();
        assert!(p.alert().is_none());
    }

    #[test]
    fn repeated_locate_with_same_result_is_stable() {
        let (mut p, _) = loaded(Coordinate::new(1.0, 2.0));
        let at = Coordinate::new(7.0, 8.0);
        let first = p.request_current_location();
        p.on_position(reply(first, Ok(at)));
        let after_first = p.state().clone();
        let second = p.request_current_location();
        p.on_position(reply(second, Ok(at)));
        assert_eq!(p.state(), &after_first);
        assert_eq!(p.coordinate(), Some(at));
    }

    #[test]
    fn superseded_reply_is_dropped() {
        let (mut p, _) = loaded(Coordinate::new(1.0, 2.0));
        let older = p.request_current_location();
        let newer = p.request_current_location();
        assert_eq!(p.on_position(reply(newer, Ok(Coordinate::new(3.0, 3.0)))), PositionOutcome::Applied(Coordinate::new(3.0, 3.0)));
        assert_eq!(p.on_position(reply(older, Ok(Coordinate::new(9.0, 9.0)))), PositionOutcome::Stale);
        assert_eq!(p.coordinate(), Some(Coordinate::new(3.0, 3.0)));
    }

    #[test]
    fn marker_click_reopens_current_popup() {
        let (mut p, r) = loaded(Coordinate::new(1.0, 2.0));
        r.clear();
        p.marker_clicked();
        assert_eq!(r.last_popup().as_deref(), Some("📍 Lat: 1, Lng: 2"));
        p.marker_clicked();
        assert_eq!(r.mounts(), 0);
        assert_eq!(r.calls().iter().filter(|c| **c == Call::OpenPopup).count(), 2);
    }

    #[test]
    fn marker_click_keeps_panned_view() {
        let marker = Coordinate::new(1.0, 2.0);
        let (mut p, r) = loaded(marker);
        let panned = Coordinate::new(4.0, 6.5);
        p.region_changed(panned, 11.0);
        r.clear();
        p.marker_clicked();
        assert_eq!(r.mounts(), 0);
        assert!(!r.calls().contains(&Call::Teardown));

        p.enter_edit_mode();
        let calls = r.calls();
        assert!(calls.contains(&Call::Mount(panned, 11.0)));
        assert!(calls.contains(&Call::AddMarker(MarkerOptions { position: marker, draggable: true })));
        assert_eq!(r.last_popup().as_deref(), Some("📍 Lat: 1, Lng: 2"));
    }

    #[test]
    fn region_change_survives_remount() {
        let (mut p, r) = loaded(Coordinate::new(1.0, 2.0));
        r.clear();
        p.region_changed(Coordinate::new(1.0, 2.0), 9.0);
        assert_eq!(r.mounts(), 0);
        p.enter_edit_mode();
        assert!(r.calls().contains(&Call::Mount(Coordinate::new(1.0, 2.0), 9.0)));
    }

    #[test]
    fn selecting_recenters_on_the_new_point() {
        let (mut p, r) = loaded(Coordinate::new(1.0, 2.0));
        p.region_changed(Coordinate::new(4.0, 6.5), 13.0);
        p.enter_edit_mode();
        r.clear();
        let target = Coordinate::new(3.0, 3.0);
        p.map_clicked(target);
        assert!(r.calls().contains(&Call::Mount(target, 13.0)));
    }

    #[test]
    fn click_near_projection_edge_is_kept_exactly() {
        let (mut p, _) = loaded(Coordinate::new(1.0, 2.0));
        p.enter_edit_mode();
        let near_pole = Coordinate::new(85.03, 10.0);
        assert!(p.map_clicked(near_pole));
        assert_eq!(p.coordinate(), Some(near_pole));
    }

    #[test]
    fn locate_failure_while_loading_falls_back() {
        let (mut p, _) = picker(None);
        let startup = p.activate().expect("startup request");
        let locate = p.request_current_location();
        let outcome = p.on_position(reply(locate, Err(GeolocationError::PermissionDenied)));
        assert_eq!(outcome, PositionOutcome::Alert(GeolocationError::PermissionDenied));
        assert_eq!(p.alert(), Some(LOCATE_FAILED_ALERT));
        assert_eq!(p.coordinate(), Some(Coordinate::FALLBACK));
        assert_eq!(p.on_position(reply(startup, Ok(Coordinate::new(5.0, 5.0)))), PositionOutcome::Stale);
        assert!(!p.is_loading());
    }

    #[test]
    fn new_default_reinitializes_and_drops_pending_lookup() {
        let (mut p, _) = picker(None);
        let request = p.activate().expect("startup request");
        let default = Coordinate::new(51.5, -0.1);
        p.set_default_location(Some(default));
        assert_eq!(p.coordinate(), Some(default));
        assert_eq!(p.on_position(reply(request, Ok(Coordinate::new(0.5, 0.5)))), PositionOutcome::Stale);
        assert_eq!(p.coordinate(), Some(default));

        p.set_default_location(None);
        assert_eq!(p.coordinate(), Some(default));
    }

    #[test]
    fn unmount_tears_down() {
        let (mut p, r) = loaded(Coordinate::new(1.0, 2.0));
        r.clear();
        p.unmount();
        assert_eq!(r.teardowns(), 1);
        assert!(p.session().is_none());
    }
}
