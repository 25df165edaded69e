use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontVec, PxScale, ScaleFont, point};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::ViewerError;
use crate::surface::{Color, Surface};

/// HUD text height in pixels.
pub const HUD_FONT_SIZE: f32 = 14.0;
/// Monospace family used when present.
const PREFERRED_FONT: &str = "ubuntumono";

/// A loaded TTF/OTF font at a fixed pixel size.
pub struct HudFont {
    font: FontVec,
    scale: PxScale,
}

impl HudFont {
    pub fn from_bytes(data: Vec<u8>, size: f32) -> Result<Self, ViewerError> {
        let font = FontVec::try_from_vec(data).map_err(|e| ViewerError::Font(e.to_string()))?;
        Ok(Self {
            font,
            scale: PxScale::from(size),
        })
    }

    pub fn load(path: &Path, size: f32) -> Result<Self, ViewerError> {
        let data = std::fs::read(path)?;
        let font = Self::from_bytes(data, size)
            .map_err(|e| ViewerError::Font(format!("{}: {e}", path.display())))?;
        debug!(path = %path.display(), "loaded HUD font");
        Ok(font)
    }

    /// Load the first usable monospace font from the system font
    /// directories.
    pub fn discover(size: f32) -> Option<Self> {
        let candidates = find_mono_fonts(&font_dirs());
        let mut ordered: Vec<&PathBuf> = pick_mono_font(&candidates).into_iter().collect();
        ordered.extend(candidates.iter());
        for path in ordered {
            match Self::load(path, size) {
                Ok(font) => {
                    info!(path = %path.display(), "using HUD font");
                    return Some(font);
                }
                Err(e) => debug!(error = %e, "skipping font"),
            }
        }
        warn!("no monospace font found; HUD text disabled");
        None
    }

    /// Draw `text` with its top-left corner at `pos`.
    pub fn draw_text(&self, surface: &mut Surface, text: &str, pos: (i32, i32), color: Color) {
        let scaled = self.font.as_scaled(self.scale);
        let baseline = pos.1 as f32 + scaled.ascent();
        let mut caret = pos.0 as f32;
        let mut prev = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = prev {
                caret += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(self.scale, point(caret, baseline));
            caret += scaled.h_advance(id);
            prev = Some(id);

            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            let (ox, oy) = (bounds.min.x as i32, bounds.min.y as i32);
            outlined.draw(|x, y, coverage| {
                surface.blend_pixel(ox + x as i32, oy + y as i32, color, coverage);
            });
        }
    }
}

/// Standard font locations for the current platform.
pub fn font_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![
        PathBuf::from("/usr/share/fonts"),
        PathBuf::from("/usr/local/share/fonts"),
        PathBuf::from("/Library/Fonts"),
        PathBuf::from("/System/Library/Fonts"),
    ];
    if let Some(home) = std::env::var_os("HOME") {
        let home = PathBuf::from(home);
        dirs.push(home.join(".fonts"));
        dirs.push(home.join(".local/share/fonts"));
        dirs.push(home.join("Library/Fonts"));
    }
    if let Some(windir) = std::env::var_os("WINDIR") {
        dirs.push(PathBuf::from(windir).join("Fonts"));
    }
    dirs
}

/// Every `.ttf` / `.otf` file under `dirs` whose name contains "mono",
/// sorted by path.
pub fn find_mono_fonts(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut fonts: Vec<PathBuf> = dirs
        .iter()
        .filter(|dir| dir.is_dir())
        .flat_map(|dir| WalkDir::new(dir).follow_links(true).into_iter())
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_mono_font(path))
        .collect();
    fonts.sort();
    fonts.dedup();
    fonts
}

fn is_mono_font(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let name = name.to_ascii_lowercase();
    let is_font = name.ends_with(".ttf") || name.ends_with(".otf");
    is_font && name.contains("mono")
}

/// Preferred family first, otherwise the first candidate.
pub fn pick_mono_font(candidates: &[PathBuf]) -> Option<&PathBuf> {
    candidates
        .iter()
        .find(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.to_ascii_lowercase().replace(['-', '_', ' '], ""))
                .is_some_and(|n| n.starts_with(PREFERRED_FONT))
        })
        .or_else(|| candidates.first())
}
