//! Generated texture data (RGBA8) ready for GPU upload.

/// Texture data in CPU-friendly format before GPU upload.
#[derive(Clone, Debug)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Supported texture formats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextureFormat {
    Rgba8,
}

/// Checker cell edge in pixels.
const CHECKER_CELL: u32 = 8;
const CHECKER_LIGHT: [u8; 4] = [235, 235, 235, 255];
const CHECKER_DARK: [u8; 4] = [40, 40, 48, 255];

impl TextureData {
    /// Create a new texture with given dimensions and RGBA8 format.
    pub fn new_rgba8(width: u32, height: u32, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            (width * height * 4) as usize,
            "Data size doesn't match RGBA8 format"
        );
        Self {
            data,
            width,
            height,
            format: TextureFormat::Rgba8,
        }
    }

    /// Two-tone checkerboard, `size` x `size` pixels.
    pub fn checkerboard(size: u32) -> Self {
        let mut data = Vec::with_capacity((size * size * 4) as usize);

        for y in 0..size {
            for x in 0..size {
                let cell = (x / CHECKER_CELL + y / CHECKER_CELL) % 2;
                if cell == 0 {
                    data.extend_from_slice(&CHECKER_LIGHT);
                } else {
                    data.extend_from_slice(&CHECKER_DARK);
                }
            }
        }

        log::debug!("Generated {}x{} checkerboard texture", size, size);
        Self::new_rgba8(size, size, data)
    }

    /// Get the number of bytes per pixel for the format.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self.format {
            TextureFormat::Rgba8 => 4,
        }
    }

    /// Check if the texture data is valid.
    pub fn is_valid(&self) -> bool {
        let expected_size = (self.width * self.height * self.bytes_per_pixel()) as usize;
        self.data.len() == expected_size && self.width > 0 && self.height > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkerboard_is_valid_rgba8() {
        let tex = TextureData::checkerboard(64);
        assert!(tex.is_valid());
        assert_eq!(tex.format, TextureFormat::Rgba8);
        assert_eq!(tex.data.len(), 64 * 64 * 4);
    }

    #[test]
    fn checkerboard_alternates_between_cells() {
        let tex = TextureData::checkerboard(32);
        let pixel = |x: u32, y: u32| {
            let i = ((y * tex.width + x) * 4) as usize;
            &tex.data[i..i + 4]
        };
        // Same cell: same color; one cell over: the other color.
        assert_eq!(pixel(0, 0), pixel(CHECKER_CELL - 1, CHECKER_CELL - 1));
        assert_ne!(pixel(0, 0), pixel(CHECKER_CELL, 0));
        assert_eq!(pixel(0, 0), pixel(CHECKER_CELL * 2, 0));
    }
}
