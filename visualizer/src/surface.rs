//! Software drawing surfaces.
//!
//! Every surface is a `tiny_skia::Pixmap`. Primitive coordinates are pixel
//! indices: `(x, y)` addresses the pixel whose top-left corner is at `(x, y)`,
//! and shapes are centered on that pixel rather than on its corner.

use tiny_skia::{
    BlendMode, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke,
    Transform,
};

use crate::error::ViewerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const MAGENTA: Color = Color::rgb(255, 0, 255);
    pub const ORANGE: Color = Color::rgb(255, 136, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }

    fn paint(self) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color_rgba8(self.r, self.g, self.b, self.a);
        paint.anti_alias = false;
        paint
    }
}

/// Axis-aligned rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn at(x: f32, y: f32) -> RectPosition {
        RectPosition { x, y }
    }
}

pub struct RectPosition {
    x: f32,
    y: f32,
}

impl RectPosition {
    pub fn of_size(self, w: f32, h: f32) -> Rect {
        Rect {
            x: self.x,
            y: self.y,
            w,
            h,
        }
    }
}

/// An RGBA drawing target.
pub struct Surface {
    pixmap: Pixmap,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Result<Self, ViewerError> {
        let pixmap = Pixmap::new(width, height).ok_or(ViewerError::Surface { width, height })?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn fill(&mut self, color: Color) {
        self.pixmap.fill(color.to_skia());
    }

    /// Open polyline through `points` in order. Fewer than two points draws
    /// nothing.
    pub fn draw_lines(&mut self, color: Color, points: &[(i32, i32)], width: f32) {
        let [first, rest @ ..] = points else {
            return;
        };
        if rest.is_empty() {
            return;
        }
        let mut pb = PathBuilder::new();
        pb.move_to(first.0 as f32 + 0.5, first.1 as f32 + 0.5);
        for &(x, y) in rest {
            pb.line_to(x as f32 + 0.5, y as f32 + 0.5);
        }
        let Some(path) = pb.finish() else {
            return;
        };
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &color.paint(), &stroke, Transform::identity(), None);
    }

    /// Circle centered on `center`. A `width` of 0 fills it, otherwise the
    /// outline is stroked with that width.
    pub fn draw_circle(&mut self, color: Color, center: (i32, i32), radius: f32, width: f32) {
        let cx = center.0 as f32 + 0.5;
        let cy = center.1 as f32 + 0.5;
        let Some(path) = PathBuilder::from_circle(cx, cy, radius) else {
            return;
        };
        let paint = color.paint();
        if width <= 0.0 {
            self.pixmap
                .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        } else {
            let stroke = Stroke {
                width,
                ..Stroke::default()
            };
            self.pixmap
                .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    /// Rectangle covering `rect`. A `width` of 0 fills it, otherwise a border
    /// of that width is drawn inside the rectangle.
    pub fn draw_rect(&mut self, color: Color, rect: Rect, width: f32) {
        let paint = color.paint();
        if width <= 0.0 {
            if let Some(r) = tiny_skia::Rect::from_xywh(rect.x, rect.y, rect.w, rect.h) {
                self.pixmap.fill_rect(r, &paint, Transform::identity(), None);
            }
            return;
        }
        let half = width / 2.0;
        let Some(r) = tiny_skia::Rect::from_xywh(
            rect.x + half,
            rect.y + half,
            rect.w - width,
            rect.h - width,
        ) else {
            return;
        };
        let path = PathBuilder::from_rect(r);
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    /// Composite `src` with its top-left corner at `dest`.
    pub fn blit(&mut self, src: &Surface, dest: (i32, i32), opacity: f32) {
        let paint = PixmapPaint {
            opacity,
            blend_mode: BlendMode::SourceOver,
            quality: FilterQuality::Nearest,
        };
        self.pixmap.draw_pixmap(
            dest.0,
            dest.1,
            src.pixmap.as_ref(),
            &paint,
            Transform::identity(),
            None,
        );
    }

    /// Stretch `src` to `size` and composite it with its top-left corner at
    /// `dest`.
    pub fn blit_scaled(&mut self, src: &Surface, dest: (i32, i32), size: (u32, u32)) {
        if size.0 == 0 || size.1 == 0 {
            return;
        }
        let sx = size.0 as f32 / src.width() as f32;
        let sy = size.1 as f32 / src.height() as f32;
        let transform = Transform::from_scale(sx, sy).post_translate(dest.0 as f32, dest.1 as f32);
        self.pixmap.draw_pixmap(
            0,
            0,
            src.pixmap.as_ref(),
            &PixmapPaint::default(),
            transform,
            None,
        );
    }

    /// Blend `color` into one pixel with the given coverage in `0.0..=1.0`.
    /// Out-of-bounds coordinates are ignored.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Color, coverage: f32) {
        let w = self.width() as i32;
        let h = self.height() as i32;
        if x < 0 || x >= w || y < 0 || y >= h {
            return;
        }
        let alpha = coverage.clamp(0.0, 1.0) * color.a as f32 / 255.0;
        if alpha <= 0.0 {
            return;
        }
        let idx = (y as usize * w as usize + x as usize) * 4;
        let px = &mut self.pixmap.data_mut()[idx..idx + 4];
        // Premultiplied source-over.
        let src = [color.r, color.g, color.b, 255];
        for (dst, s) in px.iter_mut().zip(src) {
            *dst = (s as f32 * alpha + *dst as f32 * (1.0 - alpha)).round() as u8;
        }
    }

    /// Demultiplied color at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some(Color {
            r: c.red(),
            g: c.green(),
            b: c.blue(),
            a: c.alpha(),
        })
    }

    /// Raw premultiplied RGBA bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }
}
