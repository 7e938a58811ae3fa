use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);
const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// One pointer-down → pointer-up polyline in canvas pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub points: Vec<(f32, f32)>,
    /// Brush diameter in canvas pixels.
    #[serde(default = "default_width")]
    pub width: f32,
}

fn default_width() -> f32 {
    18.0
}

impl Stroke {
    pub fn new(points: Vec<(f32, f32)>, width: f32) -> Self {
        Stroke { points, width }
    }
}

/// Square white canvas that strokes are rasterised onto with a round brush.
pub struct StrokeCanvas {
    image: RgbaImage,
}

impl StrokeCanvas {
    pub fn new(size: u32) -> Self {
        StrokeCanvas { image: RgbaImage::from_pixel(size, size, PAPER) }
    }

    pub fn size(&self) -> u32 {
        self.image.width()
    }

    /// Stamps the brush every half pixel along each segment. A stroke with a
    /// single point leaves a dot.
    ///
    /// Segments are clipped to the canvas grown by the brush radius first, so
    /// far off-canvas points cost no more than an edge-to-edge line.
    /// Segments with non-finite coordinates are skipped and the brush is
    /// never wider than twice the canvas.
    pub fn draw(&mut self, stroke: &Stroke) {
        let radius = (stroke.width / 2.0).clamp(0.5, self.image.width().max(1) as f32);
        if !radius.is_finite() {
            return;
        }
        let (lo, hi) = (-radius, self.image.width() as f32 + radius);
        match stroke.points.as_slice() {
            [] => {}
            [p] => self.stamp(*p, radius),
            pts => {
                for seg in pts.windows(2) {
                    let Some((a, b)) = clip_segment(seg[0], seg[1], lo, hi) else {
                        continue;
                    };
                    let len = ((b.0 - a.0).powi(2) + (b.1 - a.1).powi(2)).sqrt();
                    let steps = (len * 2.0).ceil().max(1.0) as usize;
                    for i in 0..=steps {
                        let t = i as f32 / steps as f32;
                        self.stamp((a.0 + (b.0 - a.0) * t, a.1 + (b.1 - a.1) * t), radius);
                    }
                }
            }
        }
    }

    pub fn draw_all(&mut self, strokes: &[Stroke]) {
        for s in strokes {
            self.draw(s);
        }
    }

    fn stamp(&mut self, (cx, cy): (f32, f32), radius: f32) {
        if !(cx.is_finite() && cy.is_finite()) {
            return;
        }
        let size = self.image.width() as i64;
        let x0 = ((cx - radius).floor() as i64).max(0);
        let x1 = ((cx + radius).ceil() as i64).min(size - 1);
        let y0 = ((cy - radius).floor() as i64).max(0);
        let y1 = ((cy + radius).ceil() as i64).min(size - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let (dx, dy) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
                if dx * dx + dy * dy <= radius * radius {
                    self.image.put_pixel(x as u32, y as u32, INK);
                }
            }
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

const LEFT: u8 = 1;
const RIGHT: u8 = 2;
const TOP: u8 = 4;
const BOTTOM: u8 = 8;

fn outcode((x, y): (f64, f64), lo: f64, hi: f64) -> u8 {
    let mut code = 0;
    if x < lo {
        code |= LEFT;
    } else if x > hi {
        code |= RIGHT;
    }
    if y < lo {
        code |= TOP;
    } else if y > hi {
        code |= BOTTOM;
    }
    code
}

/// Cohen-Sutherland clip of segment `a`-`b` to the square `[lo, hi]²`.
///
/// Works in f64 and moves endpoints onto the boundary exactly, so segments
/// with huge coordinates still land on the right pixels.
fn clip_segment(a: (f32, f32), b: (f32, f32), lo: f32, hi: f32) -> Option<((f32, f32), (f32, f32))> {
    if ![a.0, a.1, b.0, b.1].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (lo, hi) = (lo as f64, hi as f64);
    let mut a = (a.0 as f64, a.1 as f64);
    let mut b = (b.0 as f64, b.1 as f64);

    // each pass pins one coordinate of one endpoint to the boundary
    for _ in 0..8 {
        let (ca, cb) = (outcode(a, lo, hi), outcode(b, lo, hi));
        if ca | cb == 0 {
            return Some(((a.0 as f32, a.1 as f32), (b.0 as f32, b.1 as f32)));
        }
        if ca & cb != 0 {
            return None;
        }
        let moving_a = ca != 0;
        let code = if moving_a { ca } else { cb };
        let ((x0, y0), (x1, y1)) = if moving_a { (a, b) } else { (b, a) };
        let pinned = if code & (LEFT | RIGHT) != 0 {
            let x = if code & LEFT != 0 { lo } else { hi };
            (x, y0 + (y1 - y0) * (x - x0) / (x1 - x0))
        } else {
            let y = if code & TOP != 0 { lo } else { hi };
            (x0 + (x1 - x0) * (y - y0) / (y1 - y0), y)
        };
        if moving_a {
            a = pinned;
        } else {
            b = pinned;
        }
    }
    None
}
