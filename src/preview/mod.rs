//! Local image preview
//!
//! Reads the selected file off the UI loop and decodes a small thumbnail
//! that the UI draws with half-block cells (two pixels per cell).

use image::{imageops::FilterType, RgbImage};
use std::path::PathBuf;

/// Largest thumbnail kept in memory; the UI scales it down further to fit
pub const THUMBNAIL_MAX_WIDTH: u32 = 192;
pub const THUMBNAIL_MAX_HEIGHT: u32 = 128;

#[derive(Debug, Clone)]
pub struct Preview {
    pub width: u32,
    pub height: u32,
    pub bytes: u64,
    /// `None` when the content could not be decoded as an image
    pub thumbnail: Option<RgbImage>,
}

impl Preview {
    pub fn is_renderable(&self) -> bool {
        self.thumbnail.is_some()
    }
}

/// One terminal cell: upper pixel as foreground, lower pixel as background
pub type HalfBlock = ([u8; 3], Option<[u8; 3]>);

/// Read and decode the file. Only I/O failures are errors.
pub async fn load(path: PathBuf) -> std::io::Result<Preview> {
    let data = tokio::fs::read(&path).await?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "preview read");
    tokio::task::spawn_blocking(move || decode(&data))
        .await
        .map_err(std::io::Error::other)
}

pub fn decode(data: &[u8]) -> Preview {
    match image::load_from_memory(data) {
        Ok(img) => Preview {
            width: img.width(),
            height: img.height(),
            bytes: data.len() as u64,
            thumbnail: Some(img.thumbnail(THUMBNAIL_MAX_WIDTH, THUMBNAIL_MAX_HEIGHT).to_rgb8()),
        },
        Err(e) => {
            tracing::warn!("Could not decode preview: {}", e);
            Preview {
                width: 0,
                height: 0,
                bytes: data.len() as u64,
                thumbnail: None,
            }
        }
    }
}

/// Scale the thumbnail to fit `cols` x `rows` cells, keeping aspect ratio
pub fn half_blocks(thumb: &RgbImage, cols: u16, rows: u16) -> Vec<Vec<HalfBlock>> {
    let (w, h) = thumb.dimensions();
    if w == 0 || h == 0 || cols == 0 || rows == 0 {
        return Vec::new();
    }

    let scale = f64::min(cols as f64 / w as f64, (rows as f64 * 2.0) / h as f64);
    let new_w = ((w as f64 * scale).floor() as u32).max(1);
    let new_h = ((h as f64 * scale).floor() as u32).max(1);
    let scaled = image::imageops::resize(thumb, new_w, new_h, FilterType::Nearest);

    (0..new_h)
        .step_by(2)
        .map(|y| {
            (0..new_w)
                .map(|x| {
                    let top = scaled.get_pixel(x, y).0;
                    let bottom = (y + 1 < new_h).then(|| scaled.get_pixel(x, y + 1).0);
                    (top, bottom)
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb};
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(w, h, |x, _| if x % 2 == 0 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_decode_png() {
        let data = png_bytes(400, 300);
        let preview = decode(&data);
        assert_eq!((preview.width, preview.height), (400, 300));
        assert_eq!(preview.bytes, data.len() as u64);
        let thumb = preview.thumbnail.unwrap();
        assert!(thumb.width() <= THUMBNAIL_MAX_WIDTH);
        assert!(thumb.height() <= THUMBNAIL_MAX_HEIGHT);
    }

    #[test]
    fn test_decode_garbage_is_not_renderable() {
        let preview = decode(b"definitely not an image");
        assert!(!preview.is_renderable());
        assert_eq!(preview.bytes, 23);
    }

    #[test]
    fn test_half_blocks_fit_area() {
        let thumb = RgbImage::from_pixel(100, 50, Rgb([10, 20, 30]));
        let cells = half_blocks(&thumb, 20, 20);
        // width-bound: 20 px wide, 10 px high -> 5 cell rows
        assert_eq!(cells.len(), 5);
        assert!(cells.iter().all(|row| row.len() == 20));
        assert_eq!(cells[0][0], ([10, 20, 30], Some([10, 20, 30])));
    }

    #[test]
    fn test_half_blocks_odd_height_has_open_bottom() {
        let thumb = RgbImage::from_pixel(3, 3, Rgb([1, 2, 3]));
        let cells = half_blocks(&thumb, 3, 2);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[1][0].1, None);
    }

    #[test]
    fn test_half_blocks_empty_area() {
        let thumb = RgbImage::from_pixel(3, 3, Rgb([1, 2, 3]));
        assert!(half_blocks(&thumb, 0, 5).is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_io_error() {
        let err = load(PathBuf::from("/definitely/not/here.png")).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
