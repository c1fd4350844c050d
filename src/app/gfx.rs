// src/app/gfx.rs
use std::path::Path;

use eframe::egui::{self as eg, ColorImage, TextureHandle};

/// Upload an RGBA image to a GPU texture. (UI thread only)
pub fn upload_rgba(ctx: &eg::Context, w: u32, h: u32, bytes: &[u8], name: &str) -> TextureHandle {
    let img = ColorImage::from_rgba_unmultiplied([w as usize, h as usize], bytes);
    ctx.load_texture(name.to_string(), img, eg::TextureOptions::LINEAR)
}

/// Load a texture from a cached poster; rejects images that are clearly not posters.
/// (UI thread only)
pub fn load_texture_from_path(
    ctx: &eg::Context,
    path: &Path,
    cache_name: &str,
) -> Result<TextureHandle, String> {
    let (w, h, bytes) = crate::app::cache::load_rgba(path)?;
    if w == 0 || h == 0 {
        return Err(format!("empty image {}", path.display()));
    }
    // Portrait sanity check ~2:3
    let ar = (w as f32) / (h as f32);
    if !(0.45..=0.90).contains(&ar) {
        return Err(format!("non-poster aspect {w}x{h} ar={ar:.2}"));
    }
    Ok(upload_rgba(ctx, w, h, &bytes, cache_name))
}
