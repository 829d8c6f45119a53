use tracing::debug;

/// Pick the MIME type for fetched image bytes.
///
/// Magic bytes win over the declared `Content-Type`, since image hosts
/// frequently answer with `application/octet-stream` or a wrong subtype.
pub fn detect_image_mime(bytes: &[u8], declared: Option<&str>) -> String {
    let declared = declared
        .and_then(|d| d.split(';').next())
        .map(str::trim)
        .filter(|d| !d.is_empty());

    match (detect_from_bytes(bytes), declared) {
        (Some(detected), Some(declared)) if detected != declared => {
            debug!(declared = declared, detected = detected, "Overriding image MIME type");
            detected.to_string()
        },
        (Some(detected), _) => detected.to_string(),
        (None, Some(declared)) => declared.to_string(),
        (None, None) => "image/jpeg".to_string(),
    }
}

fn detect_from_bytes(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() >= 4 && bytes[..4] == [0x89, 0x50, 0x4E, 0x47] {
        return Some("image/png");
    }
    if bytes.len() >= 3 && bytes[..3] == [0xFF, 0xD8, 0xFF] {
        return Some("image/jpeg");
    }
    if bytes.len() >= 4 && bytes[..4] == *b"GIF8" {
        return Some("image/gif");
    }
    if bytes.len() >= 12 && bytes[..4] == *b"RIFF" && bytes[8..12] == *b"WEBP" {
        return Some("image/webp");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::detect_image_mime;

    #[test]
    fn jpeg_overrides_declared_png() {
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0x00];
        assert_eq!(detect_image_mime(&jpeg, Some("image/png")), "image/jpeg");
    }

    #[test]
    fn unknown_bytes_keep_declared_without_params() {
        assert_eq!(detect_image_mime(b"????", Some("image/avif; q=1")), "image/avif");
    }

    #[test]
    fn nothing_known_defaults_to_jpeg() {
        assert_eq!(detect_image_mime(b"", None), "image/jpeg");
    }
}
