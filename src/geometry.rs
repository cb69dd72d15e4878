//! Pure placement math for the compositor.
//!
//! Nothing in this module touches pixels. It turns the user's [`Transform`]
//! and a bitmap's natural size into a [`Placement`] on the logical surface,
//! and provides the cover/fit scaling rules used by every layer.

/// Smallest artwork scale the controller accepts.
pub const MIN_SCALE: f32 = 0.2;
/// Largest artwork scale the controller accepts.
pub const MAX_SCALE: f32 = 3.0;
/// Default artwork scale; non-unity so artwork fills the lid by default.
pub const DEFAULT_SCALE: f32 = 1.5;

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns true if width equals height.
    pub fn is_square(&self) -> bool {
        self.width == self.height
    }
}

/// A point in logical surface units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A rectangle in logical surface units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectF {
    /// X offset from the left edge of the surface
    pub x: f32,
    /// Y offset from the top edge of the surface
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectF {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Creates a rectangle starting at origin (0, 0) with the given dimensions.
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> PointF {
        PointF::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Shrinks the rectangle by `amount` on every side.
    pub fn inset(&self, amount: f32) -> Self {
        Self::new(
            self.x + amount,
            self.y + amount,
            self.width - amount * 2.0,
            self.height - amount * 2.0,
        )
    }

    pub fn contains(&self, p: PointF) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

// ============================================================================
// Transform
// ============================================================================

/// The user-controlled placement of the artwork layer.
///
/// Scale is kept within [`MIN_SCALE`]..=[`MAX_SCALE`] and rotation within
/// -180..=180 degrees. Every constructor and setter enforces this, so the
/// renderer can trust whatever it is handed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    translate_x: f32,
    translate_y: f32,
    scale: f32,
    rotation_degrees: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translate_x: 0.0,
            translate_y: 0.0,
            scale: DEFAULT_SCALE,
            rotation_degrees: 0.0,
        }
    }
}

impl Transform {
    /// Builds a transform, clamping scale and normalizing rotation.
    ///
    /// Non-finite components fall back to their defaults.
    pub fn new(translate_x: f32, translate_y: f32, scale: f32, rotation_degrees: f32) -> Self {
        let mut t = Self::default();
        t.set_translation(translate_x, translate_y);
        t.set_scale(scale);
        t.set_rotation(rotation_degrees);
        t
    }

    pub fn translate_x(&self) -> f32 {
        self.translate_x
    }

    pub fn translate_y(&self) -> f32 {
        self.translate_y
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn rotation_degrees(&self) -> f32 {
        self.rotation_degrees
    }

    /// Sets the translation. Translation is unbounded; non-finite values are ignored.
    pub fn set_translation(&mut self, x: f32, y: f32) {
        if x.is_finite() && y.is_finite() {
            self.translate_x = x;
            self.translate_y = y;
        }
    }

    /// Sets the scale, clamped to [`MIN_SCALE`]..=[`MAX_SCALE`].
    ///
    /// Returns the value actually stored.
    pub fn set_scale(&mut self, scale: f32) -> f32 {
        if scale.is_finite() {
            self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
        }
        self.scale
    }

    /// Sets the rotation, wrapping values outside -180..=180 onto that range.
    ///
    /// Returns the value actually stored.
    pub fn set_rotation(&mut self, degrees: f32) -> f32 {
        if degrees.is_finite() {
            self.rotation_degrees = normalize_rotation(degrees);
        }
        self.rotation_degrees
    }
}

/// Wraps an angle onto -180..=180 degrees. In-range values are returned as-is.
pub fn normalize_rotation(degrees: f32) -> f32 {
    if (-180.0..=180.0).contains(&degrees) {
        degrees
    } else {
        (degrees + 180.0).rem_euclid(360.0) - 180.0
    }
}

// ============================================================================
// Scaling rules
// ============================================================================

/// Scale factor that makes `natural` fully cover `target`.
pub fn cover_scale(natural: SizePx, target: RectF) -> f32 {
    let (w, h) = natural_dims(natural);
    (target.width / w).max(target.height / h)
}

/// Scale factor that makes `natural` fully fit inside `target`.
pub fn fit_scale(natural: SizePx, target: RectF) -> f32 {
    let (w, h) = natural_dims(natural);
    (target.width / w).min(target.height / h)
}

/// The centered rectangle a bitmap occupies when cover-scaled into `target`.
///
/// The result overflows `target` on one axis unless the aspect ratios match;
/// callers crop by clipping.
pub fn cover_rect(natural: SizePx, target: RectF) -> RectF {
    let (w, h) = natural_dims(natural);
    let scale = cover_scale(natural, target);
    let sw = w * scale;
    let sh = h * scale;
    RectF::new(
        target.x + (target.width - sw) / 2.0,
        target.y + (target.height - sh) / 2.0,
        sw,
        sh,
    )
}

fn natural_dims(natural: SizePx) -> (f32, f32) {
    (natural.width.max(1) as f32, natural.height.max(1) as f32)
}

// ============================================================================
// Placement
// ============================================================================

/// Where the artwork lands on the logical surface.
///
/// `width`/`height` are the drawn size before rotation; the artwork is
/// rotated by `rotation_degrees` about `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub center: PointF,
    pub width: f32,
    pub height: f32,
    pub rotation_degrees: f32,
    /// Logical units per bitmap pixel.
    pub pixel_scale: f32,
    natural: SizePx,
}

impl Placement {
    /// The four corners in drawing order (top-left, top-right, bottom-right,
    /// bottom-left of the unrotated artwork).
    pub fn corners(&self) -> [PointF; 4] {
        let (sin, cos) = self.rotation_degrees.to_radians().sin_cos();
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)].map(|(dx, dy)| {
            PointF::new(
                self.center.x + dx * cos - dy * sin,
                self.center.y + dx * sin + dy * cos,
            )
        })
    }

    /// Axis-aligned bounding box of the rotated artwork.
    pub fn bounds(&self) -> RectF {
        let corners = self.corners();
        let mut min = corners[0];
        let mut max = corners[0];
        for c in &corners[1..] {
            min.x = min.x.min(c.x);
            min.y = min.y.min(c.y);
            max.x = max.x.max(c.x);
            max.y = max.y.max(c.y);
        }
        RectF::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    /// Affine matrix mapping bitmap pixels onto the logical surface, as
    /// `[sx, ky, kx, sy, tx, ty]`.
    ///
    /// Equivalent to translate(center) then rotate then scale then
    /// translate(-natural / 2).
    pub fn to_row(&self) -> [f32; 6] {
        let (sin, cos) = self.rotation_degrees.to_radians().sin_cos();
        let k = self.pixel_scale;
        let hw = self.natural.width as f32 / 2.0;
        let hh = self.natural.height as f32 / 2.0;
        [
            k * cos,
            k * sin,
            -k * sin,
            k * cos,
            self.center.x - k * (cos * hw - sin * hh),
            self.center.y - k * (sin * hw + cos * hh),
        ]
    }
}

/// Computes the artwork placement for `transform` inside `area`.
///
/// The artwork is fit-scaled into the area, multiplied by the user scale,
/// centered on the area center offset by the (unrotated) translation and
/// rotated about that point.
pub fn place_artwork(transform: &Transform, natural: SizePx, area: RectF) -> Placement {
    let (w, h) = natural_dims(natural);
    let pixel_scale = transform.scale() * fit_scale(natural, area);
    let center = area.center();
    Placement {
        center: PointF::new(
            center.x + transform.translate_x(),
            center.y + transform.translate_y(),
        ),
        width: w * pixel_scale,
        height: h * pixel_scale,
        rotation_degrees: transform.rotation_degrees(),
        pixel_scale,
        natural: SizePx::new(w as u32, h as u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn rect_helpers() {
        let rect = RectF::new(28.0, 28.0, 584.0, 584.0);
        assert_eq!(rect.right(), 612.0);
        assert_eq!(rect.bottom(), 612.0);
        assert_eq!(rect.center(), PointF::new(320.0, 320.0));
        assert_eq!(rect.inset(16.0), RectF::new(44.0, 44.0, 552.0, 552.0));
        assert!(rect.contains(PointF::new(30.0, 600.0)));
        assert!(!rect.contains(PointF::new(10.0, 600.0)));
    }

    #[test]
    fn size_px_is_square() {
        assert!(SizePx::new(640, 640).is_square());
        assert!(!SizePx::new(4000, 2000).is_square());
    }

    #[test]
    fn transform_default() {
        let t = Transform::default();
        assert_eq!(t.translate_x(), 0.0);
        assert_eq!(t.translate_y(), 0.0);
        assert_eq!(t.scale(), 1.5);
        assert_eq!(t.rotation_degrees(), 0.0);
    }

    #[test]
    fn transform_clamps_scale() {
        let mut t = Transform::default();
        assert_eq!(t.set_scale(0.01), MIN_SCALE);
        assert_eq!(t.set_scale(12.0), MAX_SCALE);
        assert_eq!(t.set_scale(f32::NAN), MAX_SCALE);
        assert_eq!(t.set_scale(-3.0), MIN_SCALE);
        assert_eq!(t.set_scale(1.0), 1.0);
    }

    #[test]
    fn transform_wraps_rotation() {
        let mut t = Transform::default();
        assert_eq!(t.set_rotation(90.0), 90.0);
        assert_eq!(t.set_rotation(180.0), 180.0);
        assert_eq!(t.set_rotation(-180.0), -180.0);
        assert_eq!(t.set_rotation(270.0), -90.0);
        assert_eq!(t.set_rotation(-270.0), 90.0);
        assert_eq!(t.set_rotation(720.0), 0.0);
        assert_eq!(t.set_rotation(f32::INFINITY), 0.0);
    }

    #[test]
    fn transform_clamp_holds_for_many_inputs() {
        let mut t = Transform::default();
        for i in -500..500 {
            let v = i as f32 * 0.37;
            t.set_scale(v);
            t.set_rotation(v * 13.0);
            assert!((MIN_SCALE..=MAX_SCALE).contains(&t.scale()));
            assert!((-180.0..=180.0).contains(&t.rotation_degrees()));
        }
    }

    #[test]
    fn cover_rect_crops_wide_image() {
        let target = RectF::new(28.0, 28.0, 584.0, 584.0);
        let rect = cover_rect(SizePx::new(200, 100), target);
        assert!(approx(rect.height, 584.0));
        assert!(approx(rect.width, 1168.0));
        assert!(approx(rect.center().x, 320.0));
        assert!(approx(rect.center().y, 320.0));
    }

    #[test]
    fn fit_scale_uses_smaller_ratio() {
        let area = RectF::from_size(584.0, 584.0);
        assert!(approx(fit_scale(SizePx::new(4000, 2000), area), 0.146));
        assert!(approx(cover_scale(SizePx::new(4000, 2000), area), 0.292));
    }

    #[test]
    fn placement_is_centered_by_default() {
        let area = RectF::new(28.0, 28.0, 584.0, 584.0);
        let p = place_artwork(&Transform::default(), SizePx::new(100, 100), area);
        assert_eq!(p.center, PointF::new(320.0, 320.0));
        assert!(approx(p.width, 876.0));
        assert!(approx(p.height, 876.0));
    }

    #[test]
    fn translation_is_applied_before_rotation() {
        let area = RectF::new(0.0, 0.0, 100.0, 100.0);
        let t = Transform::new(10.0, 0.0, 1.0, 90.0);
        let p = place_artwork(&t, SizePx::new(100, 100), area);
        // The center moves along the unrotated x axis regardless of rotation.
        assert_eq!(p.center, PointF::new(60.0, 50.0));
    }

    #[test]
    fn rotation_by_90_swaps_bounds() {
        let area = RectF::new(28.0, 28.0, 584.0, 584.0);
        let natural = SizePx::new(4000, 2000);

        let flat = place_artwork(&Transform::new(0.0, 0.0, 1.0, 0.0), natural, area);
        let turned = place_artwork(&Transform::new(0.0, 0.0, 1.0, 90.0), natural, area);

        let a = flat.bounds();
        let b = turned.bounds();
        assert!(approx(a.width, 584.0));
        assert!(approx(a.height, 292.0));
        assert!(approx(b.width, a.height));
        assert!(approx(b.height, a.width));
        assert!(approx(b.center().x, 320.0));
        assert!(approx(b.center().y, 320.0));
    }

    #[test]
    fn affine_maps_bitmap_corners_to_placement_corners() {
        let area = RectF::new(28.0, 28.0, 584.0, 584.0);
        let natural = SizePx::new(400, 200);
        let p = place_artwork(&Transform::new(12.0, -7.0, 0.8, 33.0), natural, area);
        let [sx, ky, kx, sy, tx, ty] = p.to_row();
        let map = |x: f32, y: f32| PointF::new(sx * x + kx * y + tx, ky * x + sy * y + ty);

        let expected = p.corners();
        let mapped = [map(0.0, 0.0), map(400.0, 0.0), map(400.0, 200.0), map(0.0, 200.0)];
        for (m, e) in mapped.iter().zip(expected.iter()) {
            assert!(approx(m.x, e.x) && approx(m.y, e.y), "{m:?} != {e:?}");
        }
    }
}
