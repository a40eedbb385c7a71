//! Saves a resolved film to disk (spec §4.9, §7.6): Radiance HDR or OpenEXR,
//! chosen by the scene's `film.image_type`, via the `image` crate's own
//! floating-point `ImageBuffer` encoders.

use core::error::SaveError;
use core::vec::Vec3f;

use crate::config::ImageType;

/// `rgb` is row-major, `width * height` long (as returned by
/// `core::film::Film::to_rgb`).
pub fn save(path: &str, width: u32, height: u32, rgb: &[Vec3f], image_type: ImageType) -> Result<(), SaveError> {
    let mut data = Vec::with_capacity(rgb.len() * 3);
    for c in rgb {
        data.push(c.x as f32);
        data.push(c.y as f32);
        data.push(c.z as f32);
    }

    let buffer = image::ImageBuffer::<image::Rgb<f32>, _>::from_raw(width, height, data)
        .ok_or_else(|| SaveError::UnsupportedType("film buffer dimensions do not match its own width/height".to_string()))?;

    let format = match image_type {
        ImageType::RadianceHdr => image::ImageFormat::Hdr,
        ImageType::OpenExr => image::ImageFormat::OpenExr,
    };

    buffer.save_with_format(path, format).map_err(|e| match e {
        image::ImageError::IoError(io_err) => SaveError::Write {
            path: path.to_string(),
            source: io_err,
        },
        other => SaveError::Write {
            path: path.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, other.to_string()),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_a_buffer_whose_length_does_not_match_its_dimensions() {
        let rgb = vec![Vec3f::splat(0.0); 3];
        let err = save("/tmp/does_not_matter.hdr", 4, 4, &rgb, ImageType::RadianceHdr).unwrap_err();
        assert!(matches!(err, SaveError::UnsupportedType(_)));
    }
}
