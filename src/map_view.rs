use makepad_widgets::*;

use crate::geo::{Coordinate, Viewport, TILE_SIZE};
use crate::session::{MapRenderer, MapSurface, MarkerOptions};
use crate::tiles::{TileCache, TileCoord, TileLayer};

live_design! {
    link widgets;
    use link::shaders::*;
    use link::widgets::*;
    use link::theme::*;

    // Shader for rendering map tiles with UV offset/scale for parent tile fallback
    DrawMapTile = {{DrawMapTile}} {
        texture tile_texture: texture2d
        has_texture: 0.0
        uv_offset: vec2(0.0, 0.0)
        uv_scale: vec2(1.0, 1.0)

        fn pixel(self) -> vec4 {
            if self.has_texture > 0.5 {
                let uv = self.uv_offset + self.pos * self.uv_scale;
                return sample2d(self.tile_texture, uv)
            }
            return vec4(0.95, 0.95, 0.95, 1.0)
        }
    }

    // Teardrop pin; the tip sits at the bottom center of the rect
    DrawMapMarker = {{DrawMapMarker}} {
        color: #2a81cb
        drag_color: #e4572e
        draggable: 0.0

        fn pixel(self) -> vec4 {
            let sdf = Sdf2d::viewport(self.pos * self.rect_size);
            let r = self.rect_size.x * 0.5;
            let c = mix(self.color, self.drag_color, self.draggable);
            sdf.move_to(r * 0.2, r * 1.5);
            sdf.line_to(r, self.rect_size.y);
            sdf.line_to(r * 1.8, r * 1.5);
            sdf.close_path();
            sdf.fill(c);
            sdf.circle(r, r, r - 1.0);
            sdf.fill(c);
            sdf.circle(r, r, r * 0.38);
            sdf.fill(#ffffff);
            return sdf.result
        }
    }

    pub GeoMapViewBase = {{GeoMapView}} {
        draw_popup_bg: {
            color: #ffffff
        }
        draw_popup_text: {
            color: #222222
            text_style: <THEME_FONT_REGULAR> {
                font_size: 10.0
            }
        }
        draw_attribution_bg: {
            color: #ffffffcc
        }
        draw_attribution_text: {
            color: #666666
            text_style: <THEME_FONT_REGULAR> {
                font_size: 9.0
            }
        }
    }

    pub GeoMapView = <GeoMapViewBase> {
        width: Fill,
        height: Fill,
    }
}

#[derive(Live, LiveRegister, LiveHook)]
#[repr(C)]
pub struct DrawMapTile {
    #[deref] pub draw_super: DrawQuad,
    #[live] pub has_texture: f32,
    #[live] pub uv_offset: Vec2,
    #[live] pub uv_scale: Vec2,
}

#[derive(Live, LiveRegister, LiveHook)]
#[repr(C)]
pub struct DrawMapMarker {
    #[deref] pub draw_super: DrawQuad,
    #[live] pub color: Vec4,
    #[live] pub drag_color: Vec4,
    #[live] pub draggable: f32,
}

#[derive(Clone, Debug, DefaultNone)]
pub enum GeoMapViewAction {
    None,
    RegionChanged {
        center: Coordinate,
        zoom: f64,
    },
    /// Only emitted while clicks are subscribed
    Tapped(Coordinate),
    MarkerTapped,
    MarkerDragged(Coordinate),
}

/// Which gestures currently move the map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interaction {
    pub panning: bool,
    pub scroll_zoom: bool,
    pub double_click_zoom: bool,
}

impl Default for Interaction {
    fn default() -> Self {
        Self { panning: true, scroll_zoom: true, double_click_zoom: true }
    }
}

#[derive(Clone, Debug, Default)]
struct MapPopup {
    text: String,
    open: bool,
}

/// Finger travel below this many pixels still counts as a tap
const TAP_SLOP: f64 = 6.0;

#[derive(Clone, Copy, Debug, PartialEq)]
enum TapKind {
    Click,
    ZoomIn,
    Ignore,
}

/// With double-click zoom off every click in a burst is a click of its own.
fn classify_tap(tap_count: u32, double_click_zoom: bool) -> TapKind {
    match tap_count {
        0 => TapKind::Ignore,
        2 if double_click_zoom => TapKind::ZoomIn,
        1 => TapKind::Click,
        _ if !double_click_zoom => TapKind::Click,
        _ => TapKind::Ignore,
    }
}

#[derive(Live, LiveHook, Widget)]
pub struct GeoMapView {
    #[walk] walk: Walk,
    #[redraw] #[live] pub draw_tile: DrawMapTile,
    #[live] draw_marker: DrawMapMarker,

    #[live] draw_popup_bg: DrawColor,
    #[live] draw_popup_text: DrawText,

    // Attribution overlay
    #[live] draw_attribution_bg: DrawColor,
    #[live] draw_attribution_text: DrawText,
    #[live(true)] pub show_attribution: bool,

    #[live(51.505)] pub center_lat: f64,
    #[live(-0.09)] pub center_lng: f64,
    #[live(13.0)] pub zoom: f64,

    #[live(1.0)] pub min_zoom: f64,
    #[live(19.0)] pub max_zoom: f64,

    #[live(25.0)] pub marker_width: f64,
    #[live(41.0)] pub marker_height: f64,

    // Momentum tunable parameters
    #[live(0.95)] pub momentum_decay: f64,
    #[live(0.5)] pub momentum_threshold: f64,

    // Mounted content
    #[rust] mounted: bool,
    #[rust] marker: Option<MarkerOptions>,
    #[rust] popup: Option<MapPopup>,
    #[rust] interaction: Interaction,
    #[rust] clicks_subscribed: bool,

    // Gesture state
    #[rust] finger_down_abs: Option<DVec2>,
    #[rust] dragging_marker: bool,
    #[rust] drag_start: Option<DVec2>,
    #[rust] drag_start_center: Option<Coordinate>,
    #[rust] viewport_rect: Rect,

    // Pinch zoom state
    #[rust] initial_pinch_distance: Option<f64>,
    #[rust] pinch_zoom_start: Option<f64>,

    // Momentum scrolling state
    #[rust] velocity_samples: Vec<(DVec2, f64)>,
    #[rust] flick_velocity: DVec2,
    #[rust] next_frame: NextFrame,
    #[rust] is_flicking: bool,

    #[rust] tile_cache: TileCache,
}

impl Widget for GeoMapView {
    fn handle_event(&mut self, cx: &mut Cx, event: &Event, scope: &mut Scope) {
        let uid = self.widget_uid();

        if let Event::NetworkResponses(responses) = event {
            let mut loaded = false;
            for response in responses {
                match &response.response {
                    NetworkResponse::HttpResponse(http_response) => {
                        loaded |= self.tile_cache.handle_response(cx, response.request_id, http_response);
                    }
                    NetworkResponse::HttpRequestError(error) => {
                        self.tile_cache.handle_error(response.request_id, error);
                    }
                    _ => {}
                }
            }
            if loaded {
                self.draw_tile.redraw(cx);
            }
        }

        if !self.mounted {
            return;
        }

        if self.next_frame.is_event(event).is_some() && self.is_flicking {
            self.apply_momentum(cx, uid, &scope.path);
        }

        if let Event::TouchUpdate(te) = event {
            if te.touches.len() >= 2 && self.interaction.scroll_zoom {
                let t0 = &te.touches[0];
                let t1 = &te.touches[1];
                let distance = (t1.abs - t0.abs).length();

                if let (Some(initial_distance), Some(start_zoom)) = (self.initial_pinch_distance, self.pinch_zoom_start) {
                    // log scale for a natural zoom feel
                    let zoom_delta = (distance / initial_distance).ln() / std::f64::consts::LN_2;
                    let new_zoom = (start_zoom + zoom_delta).clamp(self.min_zoom, self.max_zoom);
                    if (new_zoom - self.zoom).abs() > 0.01 {
                        self.zoom = new_zoom;
                        self.draw_tile.redraw(cx);
                    }
                } else {
                    self.initial_pinch_distance = Some(distance);
                    self.pinch_zoom_start = Some(self.zoom);
                }

                self.drag_start = None;
                self.drag_start_center = None;
            }
        }

        match event.hits(cx, self.draw_tile.area()) {
            Hit::FingerDown(fe) if fe.is_primary_hit() => {
                cx.set_key_focus(self.draw_tile.area());
                self.finger_down_abs = Some(fe.abs);
                self.is_flicking = false;
                self.velocity_samples.clear();

                let draggable = self.marker.is_some_and(|m| m.draggable);
                if draggable && self.marker_hit(fe.abs) {
                    self.dragging_marker = true;
                } else if self.interaction.panning {
                    self.drag_start = Some(fe.abs);
                    self.drag_start_center = Some(self.center());
                    self.velocity_samples.push((fe.abs, fe.time));
                }
            }
            Hit::FingerMove(fe) => {
                if self.dragging_marker {
                    let at = self.screen_to_geo(fe.abs);
                    if let Some(marker) = &mut self.marker {
                        marker.position = at;
                    }
                    self.draw_tile.redraw(cx);
                } else if self.initial_pinch_distance.is_none() {
                    if let (Some(start), Some(start_center)) = (self.drag_start, self.drag_start_center) {
                        let delta = fe.abs - start;
                        let viewport = Viewport { center: start_center, ..self.viewport() };
                        self.set_center_coordinate(viewport.panned(delta.x, delta.y));
                        self.draw_tile.redraw(cx);

                        // keep the last 4 samples
                        self.velocity_samples.push((fe.abs, fe.time));
                        if self.velocity_samples.len() > 4 {
                            self.velocity_samples.remove(0);
                        }
                    }
                }
            }
            Hit::FingerUp(fe) if fe.is_primary_hit() => {
                self.initial_pinch_distance = None;
                self.pinch_zoom_start = None;

                let was_tap = self
                    .finger_down_abs
                    .take()
                    .is_some_and(|down| (fe.abs - down).length() < TAP_SLOP);

                if self.dragging_marker {
                    self.dragging_marker = false;
                    if let Some(marker) = self.marker {
                        if was_tap {
                            cx.widget_action(uid, &scope.path, GeoMapViewAction::MarkerTapped);
                        } else {
                            cx.widget_action(uid, &scope.path, GeoMapViewAction::MarkerDragged(marker.position));
                        }
                    }
                    return;
                }

                let tap = if fe.is_over {
                    classify_tap(fe.tap_count, self.interaction.double_click_zoom)
                } else {
                    TapKind::Ignore
                };
                match tap {
                    TapKind::Click if was_tap => {
                        if self.marker.is_some() && self.marker_hit(fe.abs) {
                            if let Some(popup) = &mut self.popup {
                                popup.open = true;
                            }
                            cx.widget_action(uid, &scope.path, GeoMapViewAction::MarkerTapped);
                        } else if self.clicks_subscribed {
                            let at = self.screen_to_geo(fe.abs);
                            cx.widget_action(uid, &scope.path, GeoMapViewAction::Tapped(at));
                        }
                    }
                    TapKind::ZoomIn => {
                        self.zoom = (self.zoom + 1.0).min(self.max_zoom);
                        self.draw_tile.redraw(cx);
                        self.emit_region_changed(cx, uid, &scope.path);
                    }
                    _ => {}
                }

                if self.drag_start.is_some() {
                    let velocity = self.calculate_flick_velocity();
                    if velocity.length() > self.momentum_threshold {
                        self.flick_velocity = velocity;
                        self.is_flicking = true;
                        self.next_frame = cx.new_next_frame();
                    }
                    self.emit_region_changed(cx, uid, &scope.path);
                }

                self.drag_start = None;
                self.drag_start_center = None;
                self.velocity_samples.clear();
            }
            Hit::FingerScroll(fe) if self.interaction.scroll_zoom => {
                let zoom_delta = if fe.scroll.y > 0.0 { 0.5 } else { -0.5 };
                let new_zoom = (self.zoom + zoom_delta).clamp(self.min_zoom, self.max_zoom);
                if new_zoom != self.zoom {
                    self.zoom = new_zoom;
                    self.draw_tile.redraw(cx);
                    self.emit_region_changed(cx, uid, &scope.path);
                }
            }
            _ => {}
        }
    }

    fn draw_walk(&mut self, cx: &mut Cx2d, _scope: &mut Scope, walk: Walk) -> DrawStep {
        cx.begin_turtle(walk, Layout::default());
        let rect = cx.turtle().rect();
        self.viewport_rect = rect;

        if self.mounted {
            self.draw_tiles(cx, rect);
            self.draw_marker_and_popup(cx, rect);
            if self.show_attribution {
                self.draw_attribution(cx, rect);
            }
        }

        cx.end_turtle_with_area(&mut self.draw_tile.draw_super.draw_vars.area);
        DrawStep::done()
    }
}

impl GeoMapView {
    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.center_lat, self.center_lng)
    }

    fn set_center_coordinate(&mut self, at: Coordinate) {
        let at = at.normalized();
        self.center_lat = at.lat;
        self.center_lng = at.lng;
    }

    fn viewport(&self) -> Viewport {
        Viewport {
            center: self.center(),
            zoom: self.zoom,
            width: self.viewport_rect.size.x,
            height: self.viewport_rect.size.y,
        }
    }

    fn screen_to_geo(&self, abs: DVec2) -> Coordinate {
        let local = abs - self.viewport_rect.pos;
        self.viewport().screen_to_geo(local.x, local.y)
    }

    fn marker_rect(&self, marker: &MarkerOptions) -> Rect {
        let (x, y) = self.viewport().geo_to_screen(marker.position);
        Rect {
            pos: dvec2(
                self.viewport_rect.pos.x + x - self.marker_width / 2.0,
                self.viewport_rect.pos.y + y - self.marker_height,
            ),
            size: dvec2(self.marker_width, self.marker_height),
        }
    }

    fn marker_hit(&self, abs: DVec2) -> bool {
        self.marker.is_some_and(|m| self.marker_rect(&m).contains(abs))
    }

    fn draw_tiles(&mut self, cx: &mut Cx2d, rect: Rect) {
        let viewport = self.viewport();
        let tile_zoom = viewport.tile_zoom();
        let zoom_scale = viewport.zoom_scale();
        let (center_world_x, center_world_y) = crate::geo::project(viewport.center, tile_zoom);

        let scaled_tile_size = TILE_SIZE * zoom_scale;
        let tiles_x = (rect.size.x / scaled_tile_size / 2.0).ceil() as i32 + 1;
        let tiles_y = (rect.size.y / scaled_tile_size / 2.0).ceil() as i32 + 1;

        let center_tile_x = (center_world_x / TILE_SIZE).floor() as i32;
        let center_tile_y = (center_world_y / TILE_SIZE).floor() as i32;
        let max_tile = 2_i32.pow(tile_zoom as u32);

        let offset_x = (center_world_x - center_tile_x as f64 * TILE_SIZE) * zoom_scale;
        let offset_y = (center_world_y - center_tile_y as f64 * TILE_SIZE) * zoom_scale;

        for dy in -tiles_y..=tiles_y {
            for dx in -tiles_x..=tiles_x {
                let tile_y = center_tile_y + dy;
                if tile_y < 0 || tile_y >= max_tile {
                    continue;
                }
                let coord = TileCoord {
                    x: (center_tile_x + dx).rem_euclid(max_tile) as u32,
                    y: tile_y as u32,
                    z: tile_zoom,
                };
                self.tile_cache.request_tile(cx.cx.cx, coord);

                self.draw_tile.has_texture = 0.0;
                self.draw_tile.uv_offset = Vec2 { x: 0.0, y: 0.0 };
                self.draw_tile.uv_scale = Vec2 { x: 1.0, y: 1.0 };
                if let Some(texture) = self.tile_cache.get_tile(&coord) {
                    self.draw_tile.draw_vars.set_texture(0, texture);
                    self.draw_tile.has_texture = 1.0;
                } else {
                    // fall back to a scaled-up ancestor
                    for (parent, (ox, oy), scale) in coord.ancestors(4) {
                        if let Some(texture) = self.tile_cache.get_tile(&parent) {
                            self.draw_tile.draw_vars.set_texture(0, texture);
                            self.draw_tile.has_texture = 1.0;
                            self.draw_tile.uv_offset = Vec2 { x: ox, y: oy };
                            self.draw_tile.uv_scale = Vec2 { x: scale, y: scale };
                            break;
                        }
                    }
                }

                let tile_rect = Rect {
                    pos: dvec2(
                        rect.pos.x + rect.size.x / 2.0 + dx as f64 * scaled_tile_size - offset_x,
                        rect.pos.y + rect.size.y / 2.0 + dy as f64 * scaled_tile_size - offset_y,
                    ),
                    size: dvec2(scaled_tile_size, scaled_tile_size),
                };
                self.draw_tile.draw_abs(cx, tile_rect);
            }
        }
    }

    fn draw_marker_and_popup(&mut self, cx: &mut Cx2d, rect: Rect) {
        let Some(marker) = self.marker else {
            return;
        };
        let marker_rect = self.marker_rect(&marker);
        self.draw_marker.draggable = if marker.draggable { 1.0 } else { 0.0 };
        self.draw_marker.draw_abs(cx, marker_rect);

        let Some(popup) = self.popup.as_ref().filter(|p| p.open) else {
            return;
        };
        let padding = 6.0;
        let font_size = self.draw_popup_text.text_style.font_size as f64;
        let line_height = font_size * 1.4;
        let lines: Vec<&str> = popup.text.lines().collect();
        // approximate glyph width, same estimate as the attribution overlay
        let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0) as f64;
        let width = widest * font_size * 0.6 + padding * 2.0;
        let height = lines.len() as f64 * line_height + padding * 2.0;

        let x = (marker_rect.pos.x + marker_rect.size.x / 2.0 - width / 2.0)
            .clamp(rect.pos.x, (rect.pos.x + rect.size.x - width).max(rect.pos.x));
        let y = (marker_rect.pos.y - height - 4.0).max(rect.pos.y);

        self.draw_popup_bg.draw_abs(cx, Rect { pos: dvec2(x, y), size: dvec2(width, height) });
        for (i, line) in lines.iter().enumerate() {
            let pos = dvec2(x + padding, y + padding + i as f64 * line_height);
            self.draw_popup_text.draw_abs(cx, pos, line);
        }
    }

    fn draw_attribution(&mut self, cx: &mut Cx2d, rect: Rect) {
        let attribution = self.tile_cache.layer().attribution.clone();
        if attribution.is_empty() {
            return;
        }
        let margin = 10.0;
        let padding = 4.0;

        // Estimate text dimensions from font size and character count
        let font_size = self.draw_attribution_text.text_style.font_size as f64;
        let text_width = attribution.chars().count() as f64 * font_size * 0.5;
        let text_height = font_size * 1.2;

        let bg_width = text_width + padding * 2.0;
        let bg_height = text_height + padding * 2.0;
        let bg_x = rect.pos.x + rect.size.x - margin - bg_width;
        let bg_y = rect.pos.y + rect.size.y - margin - bg_height;

        self.draw_attribution_bg.draw_abs(cx, Rect {
            pos: dvec2(bg_x, bg_y),
            size: dvec2(bg_width, bg_height),
        });
        self.draw_attribution_text.draw_abs(cx, dvec2(bg_x + padding, bg_y + padding), &attribution);
    }

    /// Average flick velocity from position/time samples, per ~60fps frame
    fn calculate_flick_velocity(&self) -> DVec2 {
        let mut total = dvec2(0.0, 0.0);
        let mut count = 0;
        for pair in self.velocity_samples.windows(2) {
            let ((pos_prev, time_prev), (pos_curr, time_curr)) = (pair[0], pair[1]);
            let dt = time_curr - time_prev;
            if dt > 0.0001 {
                total = total + (pos_curr - pos_prev) / dt;
                count += 1;
            }
        }
        if count == 0 {
            return dvec2(0.0, 0.0);
        }
        total / count as f64 * 0.016
    }

    fn apply_momentum(&mut self, cx: &mut Cx, uid: WidgetUid, path: &HeapLiveIdPath) {
        self.flick_velocity = self.flick_velocity * self.momentum_decay;

        if self.flick_velocity.length() < self.momentum_threshold * 0.01 || !self.interaction.panning {
            self.is_flicking = false;
            self.emit_region_changed(cx, uid, path);
            return;
        }

        let center = self.viewport().panned(self.flick_velocity.x, self.flick_velocity.y);
        self.set_center_coordinate(center);

        self.draw_tile.redraw(cx);
        self.next_frame = cx.new_next_frame();
    }

    fn emit_region_changed(&self, cx: &mut Cx, uid: WidgetUid, path: &HeapLiveIdPath) {
        cx.widget_action(
            uid,
            path,
            GeoMapViewAction::RegionChanged { center: self.center(), zoom: self.zoom },
        );
    }

    /// Replace everything shown with a bare map at `center`
    fn mount(&mut self, center: Coordinate, zoom: f64) {
        self.teardown();
        self.set_center_coordinate(center);
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.mounted = true;
    }

    fn teardown(&mut self) {
        self.mounted = false;
        self.marker = None;
        self.popup = None;
        self.interaction = Interaction::default();
        self.clicks_subscribed = false;
        self.dragging_marker = false;
        self.drag_start = None;
        self.drag_start_center = None;
        self.finger_down_abs = None;
        self.is_flicking = false;
        self.velocity_samples.clear();
    }

    pub fn set_zoom(&mut self, cx: &mut Cx, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.draw_tile.redraw(cx);
    }
}

impl GeoMapViewRef {
    pub fn set_zoom(&self, cx: &mut Cx, zoom: f64) {
        if let Some(mut inner) = self.borrow_mut() {
            inner.set_zoom(cx, zoom);
        }
    }

    fn action(&self, actions: &Actions) -> GeoMapViewAction {
        actions
            .find_widget_action(self.widget_uid())
            .map(|action| action.cast::<GeoMapViewAction>())
            .unwrap_or_default()
    }

    pub fn tapped(&self, actions: &Actions) -> Option<Coordinate> {
        match self.action(actions) {
            GeoMapViewAction::Tapped(at) => Some(at),
            _ => None,
        }
    }

    pub fn marker_tapped(&self, actions: &Actions) -> bool {
        matches!(self.action(actions), GeoMapViewAction::MarkerTapped)
    }

    pub fn marker_dragged(&self, actions: &Actions) -> Option<Coordinate> {
        match self.action(actions) {
            GeoMapViewAction::MarkerDragged(at) => Some(at),
            _ => None,
        }
    }

    pub fn region_changed(&self, actions: &Actions) -> Option<(Coordinate, f64)> {
        match self.action(actions) {
            GeoMapViewAction::RegionChanged { center, zoom } => Some((center, zoom)),
            _ => None,
        }
    }
}

/// Mounts picker sessions onto a [`GeoMapView`].
///
/// The widget only changes state here; callers redraw it once the session is
/// in place.
#[derive(Clone)]
pub struct GeoMapRenderer {
    map: GeoMapViewRef,
}

impl GeoMapRenderer {
    pub fn new(map: GeoMapViewRef) -> Self {
        Self { map }
    }
}

impl MapRenderer for GeoMapRenderer {
    type Surface = GeoMapSurface;

    fn mount(&mut self, center: Coordinate, zoom: f64) -> GeoMapSurface {
        if let Some(mut inner) = self.map.borrow_mut() {
            inner.mount(center, zoom);
        }
        GeoMapSurface { map: self.map.clone() }
    }
}

pub struct GeoMapSurface {
    map: GeoMapViewRef,
}

impl GeoMapSurface {
    fn with(&self, f: impl FnOnce(&mut GeoMapView)) {
        if let Some(mut inner) = self.map.borrow_mut() {
            f(&mut inner);
        }
    }
}

impl MapSurface for GeoMapSurface {
    fn add_tile_layer(&mut self, layer: &TileLayer) {
        self.with(|map| map.tile_cache.set_layer(layer.clone()));
    }

    fn add_marker(&mut self, marker: MarkerOptions) {
        self.with(|map| map.marker = Some(marker));
    }

    fn remove_marker(&mut self) {
        self.with(|map| {
            map.marker = None;
            map.popup = None;
        });
    }

    fn bind_popup(&mut self, text: String) {
        self.with(|map| map.popup = Some(MapPopup { text, open: false }));
    }

    fn open_popup(&mut self) {
        self.with(|map| {
            if let Some(popup) = &mut map.popup {
                popup.open = true;
            }
        });
    }

    fn set_panning(&mut self, enabled: bool) {
        self.with(|map| {
            map.interaction.panning = enabled;
            if !enabled {
                map.is_flicking = false;
            }
        });
    }

    fn set_scroll_zoom(&mut self, enabled: bool) {
        self.with(|map| map.interaction.scroll_zoom = enabled);
    }

    fn set_double_click_zoom(&mut self, enabled: bool) {
        self.with(|map| map.interaction.double_click_zoom = enabled);
    }

    fn set_marker_draggable(&mut self, draggable: bool) {
        self.with(|map| {
            if let Some(marker) = &mut map.marker {
                marker.draggable = draggable;
            }
        });
    }

    fn subscribe_clicks(&mut self) {
        self.with(|map| map.clicks_subscribed = true);
    }

    fn unsubscribe_clicks(&mut self) {
        self.with(|map| map.clicks_subscribed = false);
    }

    fn teardown(&mut self) {
        self.with(|map| map.teardown());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_click_zooms_when_enabled() {
        assert_eq!(classify_tap(1, true), TapKind::Click);
        assert_eq!(classify_tap(2, true), TapKind::ZoomIn);
        assert_eq!(classify_tap(3, true), TapKind::Ignore);
    }

    #[test]
    fn every_click_counts_when_double_click_zoom_is_off() {
        assert_eq!(classify_tap(1, false), TapKind::Click);
        assert_eq!(classify_tap(2, false), TapKind::Click);
        assert_eq!(classify_tap(3, false), TapKind::Click);
        assert_eq!(classify_tap(0, false), TapKind::Ignore);
    }
}
