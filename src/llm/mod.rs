pub mod embeddings;
pub mod refine;
pub mod vision;

use std::path::Path;

/// MIME type for an image path, by extension. Unknown extensions are sent as JPEG.
pub fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_known_extensions() {
        assert_eq!(mime_for_path(Path::new("a/b.PNG")), "image/png");
        assert_eq!(mime_for_path(Path::new("b.gif")), "image/gif");
        assert_eq!(mime_for_path(Path::new("b.webp")), "image/webp");
    }

    #[test]
    fn test_mime_defaults_to_jpeg() {
        assert_eq!(mime_for_path(Path::new("b.jpeg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("no_extension")), "image/jpeg");
    }
}
