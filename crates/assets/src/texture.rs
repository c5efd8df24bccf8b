use crate::AssetError;
use std::path::Path;

/// Decoded RGBA8 image, rows top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureData {
    /// Decode a PNG or JPEG file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let image = image::open(path)?.to_rgba8();
        let (width, height) = image.dimensions();
        tracing::debug!("loaded texture {} ({width}x{height})", path.display());
        Ok(Self {
            width,
            height,
            rgba: image.into_raw(),
        })
    }

    /// Single texel of one color. Bound for meshes without a texture.
    pub fn solid(color: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: color.to_vec(),
        }
    }

    /// Two-color checkerboard of `size` x `size` texels split into
    /// `cells` x `cells` squares.
    pub fn checkerboard(size: u32, cells: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let cell = (size / cells.max(1)).max(1);
        let mut rgba = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let color = if (x / cell + y / cell) % 2 == 0 { a } else { b };
                rgba.extend_from_slice(&color);
            }
        }
        Self {
            width: size,
            height: size,
            rgba,
        }
    }

    /// Bytes per row, as expected by texture uploads.
    pub fn bytes_per_row(&self) -> u32 {
        4 * self.width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_is_one_texel() {
        let t = TextureData::solid([255, 255, 255, 255]);
        assert_eq!((t.width, t.height), (1, 1));
        assert_eq!(t.rgba.len(), 4);
    }

    #[test]
    fn checkerboard_alternates() {
        let a = [10, 10, 10, 255];
        let b = [200, 200, 200, 255];
        let t = TextureData::checkerboard(4, 2, a, b);
        assert_eq!(t.rgba.len(), 4 * 4 * 4);
        let texel = |x: usize, y: usize| &t.rgba[(y * 4 + x) * 4..(y * 4 + x) * 4 + 4];
        assert_eq!(texel(0, 0), a);
        assert_eq!(texel(2, 0), b);
        assert_eq!(texel(2, 2), a);
        assert_eq!(t.bytes_per_row(), 16);
    }

    #[test]
    fn load_png_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tex.png");
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]));
        img.save(&path).unwrap();

        let t = TextureData::load(&path).unwrap();
        assert_eq!((t.width, t.height), (3, 2));
        assert_eq!(&t.rgba[..4], &[1, 2, 3, 255]);
    }

    #[test]
    fn load_garbage_is_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.png");
        std::fs::write(&path, b"not a png").unwrap();
        assert!(matches!(
            TextureData::load(&path),
            Err(AssetError::Image(_))
        ));
    }
}
