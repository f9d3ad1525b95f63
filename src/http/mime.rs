//! MIME type detection module
//!
//! Returns the Content-Type for a body file based on its extension.

use std::path::Path;

/// Get the MIME type for a file extension, matched case-insensitively
pub fn mime_type(extension: Option<&str>) -> &'static str {
    let extension = extension.map(str::to_ascii_lowercase);
    match extension.as_deref() {
        // Text
        Some("html" | "htm") => "text/html",
        Some("css") => "text/css",
        Some("txt" | "md") => "text/plain",
        Some("csv") => "text/csv",
        Some("xml") => "application/xml",

        // JavaScript/WASM
        Some("js" | "mjs") => "application/javascript",
        Some("json") => "application/json",
        Some("wasm") => "application/wasm",

        // Images
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",

        // Video
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("ogg" | "ogv") => "video/ogg",

        // Audio
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",

        // Documents
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("gz" | "gzip") => "application/gzip",
        Some("tar") => "application/x-tar",

        // Default
        _ => "application/octet-stream",
    }
}

/// Content-Type header value for the body file, always carrying a UTF-8 charset
///
/// # Examples
/// ```ignore
/// assert_eq!(content_type(Path::new("www/index.html")), "text/html; charset=utf-8");
/// ```
pub fn content_type(path: &Path) -> String {
    let mime = mime_type(path.extension().and_then(|e| e.to_str()));
    format!("{mime}; charset=utf-8")
}
