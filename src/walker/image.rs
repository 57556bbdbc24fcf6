use base64::Engine;
use base64::prelude::BASE64_STANDARD;

use super::model::ImageFormat;
use crate::error::ImageError;

/// Decode an embedded `data:<mime>;base64,<payload>` image source.
///
/// # Errors
///
/// Returns [`ImageError::NotDataUri`] for remote or relative sources,
/// [`ImageError::Unsupported`] for non-raster or non-base64 payloads and
/// [`ImageError::Decode`] when the payload is not valid base64.
pub fn decode_data_uri(source: &str) -> Result<(ImageFormat, Vec<u8>), ImageError> {
    let rest = source
        .trim()
        .strip_prefix("data:")
        .ok_or(ImageError::NotDataUri)?;
    let (meta, payload) = rest.split_once(',').ok_or(ImageError::NotDataUri)?;

    let mut params = meta.split(';');
    let mime = params.next().unwrap_or_default();
    if !params.any(|p| p.trim().eq_ignore_ascii_case("base64")) {
        return Err(ImageError::Unsupported(format!("{mime} (not base64)")));
    }
    let format = ImageFormat::from_mime(mime)
        .ok_or_else(|| ImageError::Unsupported(mime.to_string()))?;

    let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let data = BASE64_STANDARD.decode(payload)?;
    Ok((format, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_png_payload() {
        let (format, data) = decode_data_uri("data:image/png;base64,YWJj").unwrap();
        assert_eq!(format, ImageFormat::Png);
        assert_eq!(data, b"abc");
    }

    #[test]
    fn tolerates_wrapped_payload() {
        let (_, data) = decode_data_uri("data:image/jpeg;base64,YW\nJj").unwrap();
        assert_eq!(data, b"abc");
    }

    #[test]
    fn rejects_remote_sources() {
        assert!(matches!(
            decode_data_uri("https://example.com/a.png"),
            Err(ImageError::NotDataUri)
        ));
    }

    #[test]
    fn rejects_vector_and_plain_payloads() {
        assert!(matches!(
            decode_data_uri("data:image/svg+xml;base64,PHN2Zz4="),
            Err(ImageError::Unsupported(_))
        ));
        assert!(matches!(
            decode_data_uri("data:image/png,raw"),
            Err(ImageError::Unsupported(_))
        ));
    }

    #[test]
    fn rejects_corrupt_base64() {
        assert!(matches!(
            decode_data_uri("data:image/png;base64,@@@"),
            Err(ImageError::Decode(_))
        ));
    }
}
