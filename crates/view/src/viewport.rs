use lineage_layout::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Largest zoom factor
pub const ZOOM_MAX: f32 = 3.0;
/// Zoom used when there is nothing to fit
pub const FALLBACK_ZOOM: f32 = 0.1;
/// Smallest zoom ever computed to fit content
const FIT_ZOOM_MIN: f32 = 0.001;
/// Share of the screen filled by fitted content
const FIT_MARGIN: f32 = 0.95;

/// Pan and zoom of the chart on screen
///
/// `offset` is where the layout origin lands relative to the centre of the
/// screen, in screen units. A layout point `p` is drawn at
/// `centre + offset + p * zoom`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub offset: Vec2,
    pub zoom: f32,
    /// Screen size
    pub size: Vec2,
    /// Lower zoom bound, so that the content never gets smaller than fitted
    pub fit_zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            offset: Vec2::zero(),
            zoom: 1.0,
            size: Vec2::zero(),
            fit_zoom: FALLBACK_ZOOM,
        }
    }
}

impl Viewport {
    pub fn new(size: Vec2) -> Self {
        Self {
            size,
            ..Default::default()
        }
    }

    fn screen_center(&self) -> Point {
        Point::new(self.size.x / 2.0, self.size.y / 2.0)
    }

    pub fn to_screen(&self, p: Point) -> Point {
        let c = self.screen_center();
        Point::new(
            c.x + self.offset.x + p.x * self.zoom,
            c.y + self.offset.y + p.y * self.zoom,
        )
    }

    pub fn to_layout(&self, p: Point) -> Point {
        let c = self.screen_center();
        Point::new(
            (p.x - c.x - self.offset.x) / self.zoom,
            (p.y - c.y - self.offset.y) / self.zoom,
        )
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.offset = Vec2::new(self.offset.x + delta.x, self.offset.y + delta.y);
    }

    /// Zoom about `pivot`, a screen position that stays put. Without a pivot
    /// the screen centre is used.
    pub fn zoom_to(&mut self, zoom: f32, pivot: Option<Point>) {
        let zoom = zoom.clamp(self.fit_zoom.min(ZOOM_MAX), ZOOM_MAX);
        let ratio = zoom / self.zoom;
        let c = self.screen_center();
        let pivot = pivot.unwrap_or(c);
        let (px, py) = (pivot.x - c.x, pivot.y - c.y);

        self.offset = Vec2::new(
            px + (self.offset.x - px) * ratio,
            py + (self.offset.y - py) * ratio,
        );
        self.zoom = zoom;
        trace!("Zoomed to {}", zoom);
    }

    pub fn resize(&mut self, size: Vec2, content: Option<&Rect>) {
        self.size = size;
        self.fit_zoom = self.fitting_zoom(content);
    }

    /// Zoom at which `content` fills the screen
    pub fn fitting_zoom(&self, content: Option<&Rect>) -> f32 {
        match content {
            Some(bounds) if self.size.x > 0.0 && self.size.y > 0.0 => {
                let zoom = (self.size.x / bounds.width()).min(self.size.y / bounds.height());
                (zoom * FIT_MARGIN).max(FIT_ZOOM_MIN)
            }
            _ => FALLBACK_ZOOM,
        }
    }

    /// Centre `content` on the screen at the zoom that fits it
    pub fn fit_to_screen(&mut self, content: Option<&Rect>) {
        self.fit_zoom = self.fitting_zoom(content);
        self.zoom = self.fit_zoom;
        self.offset = match content {
            Some(bounds) => {
                let c = bounds.center();
                Vec2::new(-c.x, -c.y).scale(self.zoom)
            }
            None => Vec2::zero(),
        };
    }
}
