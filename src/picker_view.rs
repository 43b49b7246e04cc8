use makepad_widgets::*;

use crate::geo::Coordinate;
use crate::geolocation::{FixedPositionProvider, GeolocationProvider, IpGeolocationProvider, PositionReply};
use crate::map_view::*;
use crate::picker::{LocationPicker, PickerConfig, PositionOutcome, PositionRequest};
use crate::state::EditMode;
use crate::tiles::TileLayer;

live_design! {
    link widgets;
    use link::widgets::*;
    use link::theme::*;
    use link::shaders::*;

    use crate::map_view::GeoMapView;

    pub LocationPickerViewBase = {{LocationPickerView}} {}

    pub LocationPickerView = <LocationPickerViewBase> {
        width: 400, height: Fit,
        flow: Down,
        spacing: 10,

        geolocation_endpoint: "https://ipapi.co/json/"
        tile_url_template: "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png"
        tile_attribution: "© OpenStreetMap contributors"

        loading = <Label> {
            width: Fit, height: Fit,
            text: "Loading map..."
        }

        body = <View> {
            visible: false,
            width: Fill, height: 400,
            flow: Overlay,

            map = <GeoMapView> {
                width: Fill, height: Fill,
            }

            alert = <View> {
                visible: false,
                width: Fill, height: Fill,
                align: { x: 0.5, y: 0.5 }
                show_bg: true
                draw_bg: { color: #00000080 }

                <RoundedView> {
                    width: 260, height: Fit,
                    flow: Down,
                    spacing: 12,
                    padding: 16,
                    show_bg: true
                    draw_bg: { color: #ffffff }

                    alert_label = <Label> {
                        width: Fill, height: Fit,
                        draw_text: {
                            color: #222222
                            wrap: Word
                        }
                        text: ""
                    }
                    alert_ok = <Button> {
                        text: "OK"
                    }
                }
            }
        }

        controls = <View> {
            visible: false,
            width: Fill, height: Fit,
            flow: Right,
            spacing: 10,

            edit_button = <Button> {
                text: "Edit Location"
            }
            locate_button = <Button> {
                text: "📍 Get My Location"
            }
        }
    }
}

#[derive(Clone, Debug, DefaultNone)]
pub enum LocationPickerAction {
    None,
    /// The user confirmed a location
    Saved(Coordinate),
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum EventRoute {
    Everything,
    AlertOnly,
}

/// An open alert is modal for input only; network replies, timers and frames
/// keep reaching the map underneath.
fn route_event(alert_open: bool, is_input: bool) -> EventRoute {
    if alert_open && is_input {
        EventRoute::AlertOnly
    } else {
        EventRoute::Everything
    }
}

fn is_input_event(event: &Event) -> bool {
    matches!(
        event,
        Event::FingerDown(_)
            | Event::FingerMove(_)
            | Event::FingerUp(_)
            | Event::FingerHoverIn(_)
            | Event::FingerHoverOver(_)
            | Event::FingerHoverOut(_)
            | Event::FingerScroll(_)
            | Event::TouchUpdate(_)
            | Event::MouseDown(_)
            | Event::MouseMove(_)
            | Event::MouseUp(_)
            | Event::KeyDown(_)
            | Event::KeyUp(_)
            | Event::TextInput(_)
    )
}

#[derive(Live, LiveHook, Widget)]
pub struct LocationPickerView {
    #[deref] view: View,

    #[live(13.0)] initial_zoom: f64,
    #[live(15.0)] locate_zoom: f64,

    #[live(false)] use_default_location: bool,
    #[live] default_lat: f64,
    #[live] default_lng: f64,

    /// Empty disables geolocation
    #[live] geolocation_endpoint: String,
    #[live] tile_url_template: String,
    #[live] tile_attribution: String,

    #[rust] picker: Option<LocationPicker<GeoMapRenderer>>,
    #[rust] provider: Option<Box<dyn GeolocationProvider>>,
    #[rust] on_save: Option<Box<dyn FnMut(Coordinate)>>,
}

impl Widget for LocationPickerView {
    fn handle_event(&mut self, cx: &mut Cx, event: &Event, scope: &mut Scope) {
        let alert_open = self.picker.as_ref().is_some_and(|p| p.alert().is_some());
        match route_event(alert_open, is_input_event(event)) {
            EventRoute::AlertOnly => self.view.view(ids!(alert)).handle_event(cx, event, scope),
            EventRoute::Everything => self.view.handle_event(cx, event, scope),
        }
        self.widget_match_event(cx, event, scope);

        let replies = match &mut self.provider {
            Some(provider) => provider.handle_event(cx, event),
            None => Vec::new(),
        };
        for reply in replies {
            self.apply_position(cx, reply);
        }
    }

    fn draw_walk(&mut self, cx: &mut Cx2d, scope: &mut Scope, walk: Walk) -> DrawStep {
        if self.picker.is_none() {
            self.activate(cx.cx.cx);
        }
        self.sync_controls(cx.cx.cx);
        self.view.draw_walk(cx, scope, walk)
    }
}

impl WidgetMatchEvent for LocationPickerView {
    fn handle_actions(&mut self, cx: &mut Cx, actions: &Actions, scope: &mut Scope) {
        let uid = self.widget_uid();
        let Some(picker) = self.picker.as_mut() else {
            return;
        };

        if self.view.button(ids!(alert_ok)).clicked(actions) {
            picker.dismiss_alert();
        }

        if self.view.button(ids!(edit_button)).clicked(actions) {
            match picker.edit_mode() {
                EditMode::View => {
                    picker.enter_edit_mode();
                }
                EditMode::Edit => {
                    let on_save = &mut self.on_save;
                    let saved = picker.save(&mut |at| {
                        if let Some(callback) = on_save.as_mut() {
                            callback(at);
                        }
                    });
                    match saved {
                        Ok(at) => cx.widget_action(uid, &scope.path, LocationPickerAction::Saved(at)),
                        Err(e) => ::log::warn!("save ignored: {}", e),
                    }
                }
            }
        }

        if self.view.button(ids!(locate_button)).clicked(actions) {
            let request = picker.request_current_location();
            self.issue(cx, request);
        }

        let map = self.view.geo_map_view(ids!(map));
        if let Some(picker) = self.picker.as_mut() {
            if let Some(at) = map.tapped(actions) {
                picker.map_clicked(at);
            }
            if map.marker_tapped(actions) {
                picker.marker_clicked();
            }
            if let Some(at) = map.marker_dragged(actions) {
                picker.marker_dragged(at);
            }
            if let Some((center, zoom)) = map.region_changed(actions) {
                picker.region_changed(center, zoom);
            }
        }

        self.sync_controls(cx);
        self.view.redraw(cx);
    }
}

impl LocationPickerView {
    fn config(&self) -> PickerConfig {
        let mut tile_layer = TileLayer::default();
        if !self.tile_url_template.is_empty() {
            tile_layer = TileLayer::new(&self.tile_url_template, &self.tile_attribution);
        }
        PickerConfig {
            default_location: self
                .use_default_location
                .then(|| Coordinate::new(self.default_lat, self.default_lng)),
            initial_zoom: self.initial_zoom,
            locate_zoom: self.locate_zoom,
            tile_layer,
        }
    }

    fn activate(&mut self, cx: &mut Cx) {
        if self.provider.is_none() {
            self.provider = Some(if self.geolocation_endpoint.is_empty() {
                Box::new(FixedPositionProvider::unavailable())
            } else {
                Box::new(IpGeolocationProvider::new(&self.geolocation_endpoint))
            });
        }
        let renderer = GeoMapRenderer::new(self.view.geo_map_view(ids!(map)));
        let mut picker = LocationPicker::new(renderer, self.config());
        let startup = picker.activate();
        self.picker = Some(picker);
        if let Some(request) = startup {
            self.issue(cx, request);
        }
    }

    fn issue(&mut self, cx: &mut Cx, request: PositionRequest) {
        match &mut self.provider {
            Some(provider) => provider.request_position(cx, request.ticket, request.options),
            None => ::log::warn!("no geolocation provider, request #{} dropped", request.ticket.seq),
        }
    }

    fn apply_position(&mut self, cx: &mut Cx, reply: PositionReply) {
        let Some(picker) = self.picker.as_mut() else {
            return;
        };
        if picker.on_position(reply) != PositionOutcome::Stale {
            self.sync_controls(cx);
            self.view.redraw(cx);
        }
    }

    /// Show what the current state calls for: placeholder or map, button
    /// caption, alert text
    fn sync_controls(&mut self, cx: &mut Cx) {
        let Some(picker) = self.picker.as_ref() else {
            return;
        };
        let loading = picker.is_loading();
        let caption = match picker.edit_mode() {
            EditMode::View => "Edit Location",
            EditMode::Edit => "Save Location",
        };
        let alert = picker.alert().map(str::to_string);

        self.view.label(ids!(loading)).set_visible(cx, loading);
        self.view.view(ids!(body)).set_visible(cx, !loading);
        self.view.view(ids!(controls)).set_visible(cx, !loading);
        self.view.button(ids!(edit_button)).set_text(cx, caption);

        self.view.view(ids!(alert)).set_visible(cx, alert.is_some());
        if let Some(text) = alert {
            self.view.label(ids!(alert_label)).set_text(cx, &text);
        }
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.picker.as_ref().and_then(|p| p.coordinate())
    }

    pub fn edit_mode(&self) -> EditMode {
        self.picker.as_ref().map(|p| p.edit_mode()).unwrap_or_default()
    }
}

impl LocationPickerViewRef {
    /// Called synchronously from within the save handler
    pub fn set_on_save(&self, on_save: impl FnMut(Coordinate) + 'static) {
        if let Some(mut inner) = self.borrow_mut() {
            inner.on_save = Some(Box::new(on_save));
        }
    }

    /// Replace the geolocation source; only affects requests issued afterwards
    pub fn set_geolocation_provider(&self, provider: Box<dyn GeolocationProvider>) {
        if let Some(mut inner) = self.borrow_mut() {
            inner.provider = Some(provider);
        }
    }

    pub fn set_default_location(&self, cx: &mut Cx, default: Option<Coordinate>) {
        if let Some(mut inner) = self.borrow_mut() {
            if let Some(at) = default {
                inner.use_default_location = true;
                inner.default_lat = at.lat;
                inner.default_lng = at.lng;
            }
            if let Some(picker) = inner.picker.as_mut() {
                picker.set_default_location(default);
            }
            inner.sync_controls(cx);
            inner.view.redraw(cx);
        }
    }

    pub fn coordinate(&self) -> Option<Coordinate> {
        self.borrow().and_then(|inner| inner.coordinate())
    }

    pub fn edit_mode(&self) -> EditMode {
        self.borrow().map(|inner| inner.edit_mode()).unwrap_or_default()
    }

    pub fn saved(&self, actions: &Actions) -> Option<Coordinate> {
        let action = actions.find_widget_action(self.widget_uid())?;
        match action.cast::<LocationPickerAction>() {
            LocationPickerAction::Saved(at) => Some(at),
            LocationPickerAction::None => None,
        }
    }
}
