//! PNG previews of height and falloff maps

use std::path::Path;

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::core::types::Result;
use crate::math::inverse_lerp;
use crate::terrain::falloff::{falloff_map, FalloffSettings};
use crate::terrain::generator::HeightMap;

/// Colour band starting at a normalized height
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColorRegion {
    pub name: String,
    /// Normalized height (0-1) where the band starts
    pub height: f32,
    pub color: [u8; 3],
}

impl ColorRegion {
    pub fn new(name: &str, height: f32, color: [u8; 3]) -> Self {
        Self { name: name.to_string(), height, color }
    }
}

/// Water to snow palette
pub fn default_regions() -> Vec<ColorRegion> {
    vec![
        ColorRegion::new("deep water", 0.0, [29, 64, 140]),
        ColorRegion::new("water", 0.3, [51, 99, 194]),
        ColorRegion::new("sand", 0.4, [210, 208, 125]),
        ColorRegion::new("grass", 0.45, [86, 152, 23]),
        ColorRegion::new("forest", 0.55, [62, 107, 18]),
        ColorRegion::new("rock", 0.7, [90, 69, 60]),
        ColorRegion::new("high rock", 0.85, [75, 60, 53]),
        ColorRegion::new("snow", 0.92, [255, 255, 255]),
    ]
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Grayscale image of a height map, black at its minimum and white at its
/// maximum
pub fn height_map_image(map: &HeightMap) -> GrayImage {
    GrayImage::from_fn(map.width() as u32, map.height() as u32, |x, y| {
        let v = inverse_lerp(map.min_value(), map.max_value(), map.get(x as usize, y as usize));
        Luma([to_byte(v)])
    })
}

pub fn falloff_image(width: usize, height: usize, settings: &FalloffSettings) -> GrayImage {
    let values = falloff_map(width, height, settings);
    GrayImage::from_fn(width as u32, height as u32, |x, y| {
        Luma([to_byte(values[y as usize * width + x as usize])])
    })
}

/// Colour of the last region whose start height `normalized` reaches
pub fn region_color(normalized: f32, regions: &[ColorRegion]) -> [u8; 3] {
    regions
        .iter()
        .take_while(|r| normalized >= r.height)
        .last()
        .or_else(|| regions.first())
        .map_or([0, 0, 0], |r| r.color)
}

/// Colour image of a height map through `regions` (sorted by height)
pub fn color_map_image(map: &HeightMap, regions: &[ColorRegion]) -> RgbImage {
    RgbImage::from_fn(map.width() as u32, map.height() as u32, |x, y| {
        let v = inverse_lerp(map.min_value(), map.max_value(), map.get(x as usize, y as usize));
        Rgb(region_color(v, regions))
    })
}

/// Write an image as PNG, creating parent directories
pub fn save_png(image: impl Into<DynamicImage>, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    image.into().save_with_format(path, image::ImageFormat::Png)?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_map() -> HeightMap {
        let values = (0..16).map(|i| (i % 4) as f32 * 10.0).collect();
        HeightMap::new(4, 4, values)
    }

    #[test]
    fn test_height_image_normalized() {
        let image = height_map_image(&gradient_map());
        assert_eq!(image.dimensions(), (4, 4));
        assert_eq!(image.get_pixel(0, 2)[0], 0);
        assert_eq!(image.get_pixel(3, 1)[0], 255);
        assert_eq!(image.get_pixel(1, 0)[0], 85);
    }

    #[test]
    fn test_region_color() {
        let regions = default_regions();
        assert_eq!(region_color(0.1, &regions), [29, 64, 140]);
        assert_eq!(region_color(0.5, &regions), [86, 152, 23]);
        assert_eq!(region_color(1.0, &regions), [255, 255, 255]);
        assert_eq!(region_color(0.5, &[]), [0, 0, 0]);

        let high = [ColorRegion::new("only", 0.5, [1, 2, 3])];
        assert_eq!(region_color(0.2, &high), [1, 2, 3]);
    }

    #[test]
    fn test_falloff_image_edges_white() {
        let image = falloff_image(9, 9, &FalloffSettings::default());
        assert_eq!(image.get_pixel(0, 4)[0], 255);
        assert_eq!(image.get_pixel(4, 4)[0], 0);
    }

    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("colors.png");
        let image = color_map_image(&gradient_map(), &default_regions());
        save_png(image, &path).unwrap();

        let loaded = image::open(&path).unwrap().to_rgb8();
        assert_eq!(loaded.dimensions(), (4, 4));
        assert_eq!(loaded.get_pixel(3, 0).0, [255, 255, 255]);
    }
}
