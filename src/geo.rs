use std::fmt;

/// Tile size in pixels (standard OSM tile size)
pub const TILE_SIZE: f64 = 256.0;

/// Latitude limit of the Web Mercator projection used by raster tiles
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_6;

/// A (latitude, longitude) pair in degrees.
///
/// Values are replaced as a whole on every update, never patched field by field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    /// Used when the device position could not be determined at startup
    pub const FALLBACK: Coordinate = Coordinate { lat: 0.0, lng: 0.0 };

    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Clamp latitude into the projectable range and wrap longitude into [-180, 180]
    pub fn normalized(self) -> Self {
        Self {
            lat: self.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE),
            lng: wrap_longitude(self.lng),
        }
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lat: {}, Lng: {}", self.lat, self.lng)
    }
}

/// Wrap into [-180, 180]. Non-finite input comes back as NaN.
pub fn wrap_longitude(lng: f64) -> f64 {
    if (-180.0..=180.0).contains(&lng) {
        return lng;
    }
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

/// Position in Web Mercator world pixels at a given integer zoom
pub fn project(at: Coordinate, tile_zoom: u8) -> (f64, f64) {
    let world_size = TILE_SIZE * 2.0_f64.powi(tile_zoom as i32);
    let x = (at.lng + 180.0) / 360.0 * world_size;
    let lat_rad = at.lat.to_radians();
    let y = (1.0 - lat_rad.tan().asinh() / std::f64::consts::PI) / 2.0 * world_size;
    (x, y)
}

/// Inverse of [`project`]
pub fn unproject(x: f64, y: f64, tile_zoom: u8) -> Coordinate {
    let world_size = TILE_SIZE * 2.0_f64.powi(tile_zoom as i32);
    let lng = x / world_size * 360.0 - 180.0;
    let lat_rad = (std::f64::consts::PI * (1.0 - 2.0 * y / world_size)).sinh().atan();
    Coordinate { lat: lat_rad.to_degrees(), lng }
}

/// The visible part of the map: a center, a fractional zoom and a size in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub center: Coordinate,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn tile_zoom(&self) -> u8 {
        (self.zoom.floor().max(0.0) as u8).min(19)
    }

    /// Scale applied to integer-zoom tiles to reach the fractional zoom
    pub fn zoom_scale(&self) -> f64 {
        2.0_f64.powf(self.zoom - self.tile_zoom() as f64)
    }

    /// Convert a viewport-local pixel position to geographic coordinates
    pub fn screen_to_geo(&self, x: f64, y: f64) -> Coordinate {
        let tile_zoom = self.tile_zoom();
        let scale = self.zoom_scale();
        let (cx, cy) = project(self.center, tile_zoom);
        let world_x = cx + (x - self.width / 2.0) / scale;
        let world_y = cy + (y - self.height / 2.0) / scale;
        unproject(world_x, world_y, tile_zoom)
    }

    /// Convert geographic coordinates to a viewport-local pixel position
    pub fn geo_to_screen(&self, at: Coordinate) -> (f64, f64) {
        let tile_zoom = self.tile_zoom();
        let scale = self.zoom_scale();
        let (cx, cy) = project(self.center, tile_zoom);
        let (wx, wy) = project(at, tile_zoom);
        (
            self.width / 2.0 + (wx - cx) * scale,
            self.height / 2.0 + (wy - cy) * scale,
        )
    }

    /// Degrees of longitude and latitude covered by one screen pixel at the center
    pub fn degrees_per_pixel(&self) -> (f64, f64) {
        let world_size = TILE_SIZE * 2.0_f64.powf(self.zoom);
        let dx = 360.0 / world_size;
        (dx, dx / self.center.lat.to_radians().cos())
    }

    /// Move the center by a pixel delta (dragging right moves the map left)
    pub fn panned(&self, dx: f64, dy: f64) -> Coordinate {
        let (deg_x, deg_y) = self.degrees_per_pixel();
        Coordinate {
            lat: self.center.lat + dy * deg_y,
            lng: self.center.lng - dx * deg_x,
        }
        .normalized()
    }
}
