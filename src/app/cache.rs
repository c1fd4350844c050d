use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Once, OnceLock};
use std::time::{Duration, SystemTime};

use image::{GenericImageView, ImageFormat};
use reqwest::blocking::Client;
use tracing::{debug, warn};

use crate::config::{load_config, DEFAULT_CACHE_DIR};

// Chosen once on first call
static CACHE_DIR_ONCE: OnceLock<PathBuf> = OnceLock::new();
static POSTER_DIR_ONCE: OnceLock<PathBuf> = OnceLock::new();
static POSTER_PRUNE_ONCE: Once = Once::new();

const POSTER_RETENTION_DAYS: u64 = 30;
const POSTER_RETENTION_SECS: u64 = POSTER_RETENTION_DAYS * 24 * 60 * 60;

pub fn cache_dir() -> PathBuf {
    CACHE_DIR_ONCE
        .get_or_init(|| {
            let cfg = load_config();
            let mut path = PathBuf::from(
                cfg.cache_dir
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CACHE_DIR.to_string()),
            );

            if let Err(e) = fs::create_dir_all(&path) {
                warn!("failed to create cache dir {}: {e}", path.display());
                // Fall back to local folder if creation failed
                path = PathBuf::from(DEFAULT_CACHE_DIR);
                let _ = fs::create_dir_all(&path);
            }
            path
        })
        .clone()
}

pub fn poster_cache_dir() -> PathBuf {
    let dir = POSTER_DIR_ONCE.get_or_init(|| {
        let mut path = cache_dir().join("posters");
        if let Err(e) = fs::create_dir_all(&path) {
            warn!("failed to create poster cache dir {}: {e}", path.display());
            path = cache_dir();
        }
        path
    });

    POSTER_PRUNE_ONCE.call_once({
        let path = dir.clone();
        move || match prune_poster_cache_in_dir(&path) {
            Ok(0) => {}
            Ok(n) => debug!("pruned {n} stale posters"),
            Err(err) => warn!("poster cache prune failed: {err}"),
        }
    });

    dir.clone()
}

fn prune_poster_cache_in_dir(dir: &Path) -> std::io::Result<usize> {
    let cutoff = SystemTime::now()
        .checked_sub(Duration::from_secs(POSTER_RETENTION_SECS))
        .unwrap_or(SystemTime::UNIX_EPOCH);
    let mut removed = 0usize;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let is_partial = path.extension().and_then(|e| e.to_str()) == Some("part");
        let modified = entry
            .metadata()?
            .modified()
            .unwrap_or(SystemTime::UNIX_EPOCH);
        if is_partial || modified < cutoff {
            let _ = fs::remove_file(&path);
            removed += 1;
        }
    }
    Ok(removed)
}

pub fn url_to_cache_key(url: &str) -> String {
    format!("{:x}", md5::compute(url.as_bytes()))
}

/// Return (width, height, RGBA8 bytes) decoded from a cached poster file.
pub fn load_rgba(path: &Path) -> Result<(u32, u32, Vec<u8>), String> {
    let mut bytes = Vec::new();
    fs::File::open(path)
        .and_then(|mut f| f.read_to_end(&mut bytes))
        .map_err(|e| format!("open {}: {e}", path.display()))?;
    let img = image::load_from_memory(&bytes).map_err(|e| format!("decode {}: {e}", path.display()))?;
    let (w, h) = img.dimensions();
    Ok((w, h, img.to_rgba8().into_raw()))
}

pub fn find_any_by_key(key: &str) -> Option<PathBuf> {
    find_in_dir(&poster_cache_dir(), key)
}

fn find_in_dir(dir: &Path, key: &str) -> Option<PathBuf> {
    ["jpg", "png"]
        .iter()
        .map(|ext| dir.join(format!("{key}.{ext}")))
        .find(|p| p.exists())
}

fn write_atomically(dest: &Path, bytes: &[u8]) -> Result<(), String> {
    if let Some(parent) = dest.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let tmp = dest.with_extension("part");
    {
        let mut f = fs::File::create(&tmp).map_err(|e| format!("create tmp: {e}"))?;
        f.write_all(bytes).map_err(|e| format!("write: {e}"))?;
    }
    fs::rename(&tmp, dest).map_err(|e| format!("rename: {e}"))
}

fn fetch_bytes(client: &Client, url: &str) -> Result<Vec<u8>, String> {
    client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.bytes())
        .map(|b| b.to_vec())
        .map_err(|e| format!("GET {url}: {e}"))
}

/// Download, normalize to PNG and store in cache. Returns the stored path.
pub fn download_and_store(client: &Client, url: &str, key: &str) -> Result<PathBuf, String> {
    let body = fetch_bytes(client, url)?;
    let img = image::load_from_memory(&body).map_err(|e| format!("decode {url}: {e}"))?;
    let mut png_bytes: Vec<u8> = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| format!("encode png: {e}"))?;

    let out = poster_cache_dir().join(format!("{key}.png"));
    write_atomically(&out, &png_bytes)?;
    Ok(out)
}

/// Download an image, shrink it to `max_width` (keeping aspect), and store as JPEG.
/// Writes `<poster_cache_dir>/<key>.jpg`; an existing file is reused as is.
pub fn download_and_store_resized(
    client: &Client,
    url: &str,
    key: &str,
    max_width: u32,
    quality: u8,
) -> Result<PathBuf, String> {
    use image::{imageops::FilterType, DynamicImage};

    let dest = poster_cache_dir().join(format!("{key}.jpg"));
    if dest.exists() {
        return Ok(dest);
    }

    let bytes = fetch_bytes(client, url)?;
    let img = image::load_from_memory(&bytes).map_err(|e| format!("decode {url}: {e}"))?;

    let (w, h) = img.dimensions();
    let out: DynamicImage = if w > max_width {
        let new_h = ((h as f32) * (max_width as f32 / w as f32))
            .round()
            .max(1.0) as u32;
        img.resize_exact(max_width, new_h, FilterType::CatmullRom)
    } else {
        img
    };

    // JPEG has no alpha channel
    let rgb = out.to_rgb8();
    let mut jpeg_bytes: Vec<u8> = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg_bytes, quality)
        .encode_image(&rgb)
        .map_err(|e| format!("jpeg encode: {e}"))?;

    write_atomically(&dest, &jpeg_bytes)?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_stable_md5_hex() {
        let a = url_to_cache_key("https://image.tmdb.org/t/p/w500/a.jpg");
        let b = url_to_cache_key("https://image.tmdb.org/t/p/w500/a.jpg");
        let c = url_to_cache_key("https://image.tmdb.org/t/p/w500/b.jpg");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn prune_drops_partial_downloads_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("k1.jpg"), b"x").unwrap();
        fs::write(dir.path().join("k2.part"), b"x").unwrap();

        assert_eq!(prune_poster_cache_in_dir(dir.path()).unwrap(), 1);
        assert!(dir.path().join("k1.jpg").exists());
        assert!(!dir.path().join("k2.part").exists());
    }

    #[test]
    fn lookup_prefers_resized_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_in_dir(dir.path(), "abc"), None);
        fs::write(dir.path().join("abc.png"), b"x").unwrap();
        assert_eq!(find_in_dir(dir.path(), "abc"), Some(dir.path().join("abc.png")));
        fs::write(dir.path().join("abc.jpg"), b"x").unwrap();
        assert_eq!(find_in_dir(dir.path(), "abc"), Some(dir.path().join("abc.jpg")));
    }

    #[test]
    fn load_rgba_decodes_cached_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.png");
        image::RgbaImage::from_pixel(2, 3, image::Rgba([1, 2, 3, 255]))
            .save(&path)
            .unwrap();

        let (w, h, bytes) = load_rgba(&path).unwrap();
        assert_eq!((w, h), (2, 3));
        assert_eq!(bytes.len(), 2 * 3 * 4);
        assert!(load_rgba(&dir.path().join("missing.png")).is_err());
    }
}
