use makepad_widgets::*;
use makepad_widgets::image_cache::ImageBuffer;
use std::collections::HashMap;

use crate::error::TileError;

pub const OSM_TILE_TEMPLATE: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
pub const OSM_ATTRIBUTION: &str = "\u{00A9} OpenStreetMap contributors";

/// A raster tile source: URL template plus the attribution it requires.
#[derive(Clone, Debug, PartialEq)]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
    /// Values substituted for `{s}`, picked per tile to spread load
    pub subdomains: Vec<String>,
}

impl Default for TileLayer {
    fn default() -> Self {
        Self::new(OSM_TILE_TEMPLATE, OSM_ATTRIBUTION)
    }
}

impl TileLayer {
    pub fn new(url_template: &str, attribution: &str) -> Self {
        Self {
            url_template: url_template.to_string(),
            attribution: attribution.to_string(),
            subdomains: vec!["a".into(), "b".into(), "c".into()],
        }
    }

    pub fn tile_url(&self, coord: &TileCoord) -> String {
        let mut url = self
            .url_template
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string());
        if !self.subdomains.is_empty() {
            let index = (coord.x as usize + coord.y as usize) % self.subdomains.len();
            url = url.replace("{s}", &self.subdomains[index]);
        }
        url
    }
}

/// OpenStreetMap tile coordinates
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl TileCoord {
    /// Walk up to `levels` zoom levels back, returning the parent and the
    /// (offset, scale) of this tile inside it
    pub fn ancestors(&self, levels: u8) -> impl Iterator<Item = (TileCoord, (f32, f32), f32)> + '_ {
        (1..=levels.min(self.z)).map(move |diff| {
            let parent = TileCoord { x: self.x >> diff, y: self.y >> diff, z: self.z - diff };
            let scale = 1.0 / (1u32 << diff) as f32;
            let offset_x = (self.x % (1 << diff)) as f32 * scale;
            let offset_y = (self.y % (1 << diff)) as f32 * scale;
            (parent, (offset_x, offset_y), scale)
        })
    }
}

#[derive(Clone)]
pub enum TileState {
    Loading,
    Loaded(Texture),
    Failed(TileError),
}

/// Accept a tile response only when it is a 200 with a body
pub fn tile_body(status_code: u16, body: Option<&[u8]>) -> Result<&[u8], TileError> {
    if status_code != 200 {
        return Err(TileError::Status(status_code));
    }
    match body {
        Some(body) if !body.is_empty() => Ok(body),
        _ => Err(TileError::EmptyBody),
    }
}

/// In-memory tile store fed by HTTP requests
pub struct TileCache {
    tiles: HashMap<TileCoord, TileState>,
    pending_requests: HashMap<LiveId, TileCoord>,
    request_counter: u64,
    layer: TileLayer,
}

impl Default for TileCache {
    fn default() -> Self {
        Self {
            tiles: HashMap::new(),
            pending_requests: HashMap::new(),
            request_counter: 0,
            layer: TileLayer::default(),
        }
    }
}

impl TileCache {
    pub fn layer(&self) -> &TileLayer {
        &self.layer
    }

    /// Switch tile source; tiles of the previous source are dropped
    pub fn set_layer(&mut self, layer: TileLayer) {
        if self.layer != layer {
            self.layer = layer;
            self.clear();
        }
    }

    /// Request a tile if not already cached or loading
    pub fn request_tile(&mut self, cx: &mut Cx, coord: TileCoord) {
        if self.tiles.contains_key(&coord) {
            return;
        }

        self.request_counter += 1;
        let request_id = LiveId::from_num(0, self.request_counter);

        let url = self.layer.tile_url(&coord);
        let mut request = HttpRequest::new(url, HttpMethod::GET);
        request.set_header("User-Agent".to_string(), "MakepadLocationPicker/0.1".to_string());
        cx.http_request(request_id, request);

        self.tiles.insert(coord, TileState::Loading);
        self.pending_requests.insert(request_id, coord);
    }

    pub fn get_tile(&self, coord: &TileCoord) -> Option<&Texture> {
        match self.tiles.get(coord) {
            Some(TileState::Loaded(texture)) => Some(texture),
            _ => None,
        }
    }

    /// Returns true when a tile became drawable
    pub fn handle_response(&mut self, cx: &mut Cx, request_id: LiveId, response: &HttpResponse) -> bool {
        let Some(coord) = self.pending_requests.remove(&request_id) else {
            return false;
        };
        let decoded = tile_body(response.status_code, response.body.as_deref()).and_then(|body| {
            ImageBuffer::from_png(body).map_err(|e| TileError::Decode(format!("{:?}", e)))
        });
        match decoded {
            Ok(buffer) => {
                let texture: Texture = buffer.into_new_texture(cx);
                self.tiles.insert(coord, TileState::Loaded(texture));
                true
            }
            Err(e) => {
                self.fail(coord, e);
                false
            }
        }
    }

    pub fn handle_error(&mut self, request_id: LiveId, error: &HttpError) {
        if let Some(coord) = self.pending_requests.remove(&request_id) {
            self.fail(coord, TileError::Request(format!("{:?}", error)));
        }
    }

    fn fail(&mut self, coord: TileCoord, error: TileError) {
        ::log::error!("tile {:?} failed: {}", coord, error);
        self.tiles.insert(coord, TileState::Failed(error));
    }

    pub fn clear(&mut self) {
        self.tiles.clear();
        self.pending_requests.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_all_placeholders() {
        let layer = TileLayer::default();
        let url = layer.tile_url(&TileCoord { x: 4, y: 1, z: 3 });
        assert_eq!(url, "https://c.tile.openstreetmap.org/3/4/1.png");
    }

    #[test]
    fn template_without_subdomain() {
        let mut layer = TileLayer::new("https://tiles.example/{z}/{x}/{y}.png", "x");
        layer.subdomains.clear();
        assert_eq!(layer.tile_url(&TileCoord { x: 0, y: 0, z: 0 }), "https://tiles.example/0/0/0.png");
    }

    #[test]
    fn only_ok_responses_with_a_body_are_decoded() {
        let png = [1u8, 2, 3];
        assert_eq!(tile_body(200, Some(&png[..])), Ok(&png[..]));
        assert_eq!(tile_body(404, Some(&png[..])), Err(TileError::Status(404)));
        assert_eq!(tile_body(200, None), Err(TileError::EmptyBody));
        assert_eq!(tile_body(200, Some(&[][..])), Err(TileError::EmptyBody));
    }

    #[test]
    fn ancestors_stop_at_root() {
        let coord = TileCoord { x: 3, y: 2, z: 2 };
        let parents: Vec<_> = coord.ancestors(4).collect();
        assert_eq!(parents.len(), 2);
        let (parent, offset, scale) = parents[0];
        assert_eq!(parent, TileCoord { x: 1, y: 1, z: 1 });
        assert_eq!(offset, (0.5, 0.0));
        assert_eq!(scale, 0.5);
        assert_eq!(parents[1].0, TileCoord { x: 0, y: 0, z: 0 });
    }
}
