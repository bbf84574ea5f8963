// src/services/upload_service.rs
use crate::error::{AppError, AppResult};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const RESOURCE_DIR: &str = "resources";
pub const PHOTO_DIR: &str = "photos";
pub const ACTIVITY_DIR: &str = "activities";
pub const UPLOAD_SUBDIRS: [&str; 3] = [RESOURCE_DIR, PHOTO_DIR, ACTIVITY_DIR];

pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;
pub const MAX_ACTIVITY_BYTES: usize = 10 * 1024 * 1024;

/// A file part pulled out of a multipart body.
#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Creates the upload root and its subdirectories.
pub async fn ensure_upload_dirs(root: &Path) -> AppResult<()> {
    for sub in UPLOAD_SUBDIRS {
        tokio::fs::create_dir_all(root.join(sub)).await?;
    }
    tracing::debug!("Upload directories ready under {}", root.display());
    Ok(())
}

/// Stored names are ours, never the client's. Anything that is not a plain
/// file name is refused.
fn resolve(root: &Path, subdir: &str, stored_name: &str) -> AppResult<PathBuf> {
    let plain = !stored_name.is_empty()
        && !stored_name.contains(['/', '\\'])
        && stored_name != "."
        && stored_name != "..";
    if !plain {
        tracing::warn!("Refusing suspicious stored name: {:?}", stored_name);
        return Err(AppError::NotFound("file not found".into()));
    }
    Ok(root.join(subdir).join(stored_name))
}

pub async fn store_file(root: &Path, subdir: &str, extension: &str, bytes: &[u8]) -> AppResult<String> {
    let stored_name = format!("{}.{}", Uuid::new_v4(), extension);
    let dir = root.join(subdir);
    tokio::fs::create_dir_all(&dir).await?;
    tokio::fs::write(dir.join(&stored_name), bytes).await?;
    tracing::info!("💾 Stored {} bytes as {}/{}", bytes.len(), subdir, stored_name);
    Ok(stored_name)
}

pub async fn read_file(root: &Path, subdir: &str, stored_name: &str) -> AppResult<Vec<u8>> {
    let path = resolve(root, subdir, stored_name)?;
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("File row points at missing file {}", path.display());
            Err(AppError::NotFound("file not found".into()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Best effort. A file that is already gone is not an error.
pub async fn remove_file(root: &Path, subdir: &str, stored_name: &str) {
    let Ok(path) = resolve(root, subdir, stored_name) else {
        return;
    };
    match tokio::fs::remove_file(&path).await {
        Ok(()) => tracing::debug!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Could not remove {}: {:?}", path.display(), e),
    }
}

/// Public URL of an image stored under a served subdirectory.
pub fn public_url(subdir: &str, stored_name: &str) -> String {
    format!("/uploads/{}/{}", subdir, stored_name)
}

/// Inverse of `public_url`, for deleting the file behind a stored URL.
pub fn stored_name_from_url<'a>(subdir: &str, url: &'a str) -> Option<&'a str> {
    url.strip_prefix("/uploads/")?
        .strip_prefix(subdir)?
        .strip_prefix('/')
        .filter(|name| !name.is_empty())
}

/// Drops any directory part a browser may send along with the file name.
pub fn display_name(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename).trim();
    if base.is_empty() {
        "file".to_string()
    } else {
        base.to_string()
    }
}

/// Raster formats accepted for photos and activity images, recognised by
/// their leading bytes. Anything else, SVG included, is refused.
fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";
    if bytes.starts_with(PNG) {
        Some("png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

/// Checks an image upload and returns the extension to store it under.
/// The declared type must be `image/*`; the stored format comes from the
/// file content, never from the client.
pub fn validate_image(content_type: Option<&str>, bytes: &[u8], max: usize) -> AppResult<&'static str> {
    let content_type = content_type.unwrap_or_default().to_ascii_lowercase();
    if !content_type.starts_with("image/") {
        return Err(AppError::UnsupportedMediaType("only image files are allowed".into()));
    }
    if bytes.is_empty() {
        return Err(AppError::BadRequest("the uploaded image is empty".into()));
    }
    if bytes.len() > max {
        return Err(AppError::PayloadTooLarge(format!(
            "images must be {}MB or smaller",
            max / (1024 * 1024)
        )));
    }

    sniff_image(bytes).ok_or_else(|| {
        tracing::warn!("Image upload refused: declared {} but content is not png/jpeg/gif/webp", content_type);
        AppError::UnsupportedMediaType("only png, jpeg, gif and webp images are allowed".into())
    })
}

/// `Content-Disposition` value with an ASCII fallback and the UTF-8 name.
pub fn attachment_header(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn image_gate() {
        assert_eq!(validate_image(Some("image/png"), PNG_BYTES, MAX_PHOTO_BYTES).unwrap(), "png");
        // The stored extension follows the content, not the declared type.
        assert_eq!(validate_image(Some("image/gif"), &[0xFF, 0xD8, 0xFF, 0xE0], MAX_PHOTO_BYTES).unwrap(), "jpg");
        assert_eq!(validate_image(Some("image/gif"), b"GIF89a....", MAX_PHOTO_BYTES).unwrap(), "gif");
        assert_eq!(validate_image(Some("image/webp"), b"RIFF\0\0\0\0WEBPVP8 ", MAX_PHOTO_BYTES).unwrap(), "webp");
        assert!(matches!(
            validate_image(Some("application/pdf"), b"%PDF-1.4", MAX_PHOTO_BYTES),
            Err(AppError::UnsupportedMediaType(_))
        ));
        assert!(matches!(
            validate_image(None, PNG_BYTES, MAX_PHOTO_BYTES),
            Err(AppError::UnsupportedMediaType(_))
        ));
        assert!(matches!(
            validate_image(Some("image/png"), &vec![0u8; MAX_PHOTO_BYTES + 1], MAX_PHOTO_BYTES),
            Err(AppError::PayloadTooLarge(_))
        ));
        assert!(matches!(validate_image(Some("image/png"), b"", MAX_PHOTO_BYTES), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn svg_and_disguised_files_are_refused() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"><script>alert(1)</script></svg>"#;
        assert!(matches!(
            validate_image(Some("image/svg+xml"), svg, MAX_PHOTO_BYTES),
            Err(AppError::UnsupportedMediaType(_))
        ));
        assert!(matches!(
            validate_image(Some("image/png"), svg, MAX_PHOTO_BYTES),
            Err(AppError::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn display_name_strips_directories() {
        assert_eq!(display_name("C:\\Users\\kim\\week1.pdf"), "week1.pdf");
        assert_eq!(display_name("../../etc/passwd"), "passwd");
        assert_eq!(display_name("/"), "file");
    }

    #[test]
    fn attachment_header_keeps_utf8_name() {
        let header = attachment_header("1주차 자료.pdf");
        assert!(header.starts_with("attachment; filename=\"1__ __.pdf\""));
        assert!(header.contains("filename*=UTF-8''1%EC%A3%BC%EC%B0%A8%20%EC%9E%90%EB%A3%8C.pdf"));
    }

    #[test]
    fn stored_urls_round_trip_to_names() {
        let url = public_url(PHOTO_DIR, "abc.png");
        assert_eq!(url, "/uploads/photos/abc.png");
        assert_eq!(stored_name_from_url(PHOTO_DIR, &url), Some("abc.png"));
        assert_eq!(stored_name_from_url(ACTIVITY_DIR, &url), None);
        assert_eq!(stored_name_from_url(PHOTO_DIR, "https://cdn/x.png"), None);
    }

    #[tokio::test]
    async fn files_are_stored_read_and_removed() {
        let dir = tempfile::tempdir().unwrap();
        let name = store_file(dir.path(), RESOURCE_DIR, "pdf", b"%PDF-1.4").await.unwrap();
        assert!(name.ends_with(".pdf"));
        assert_eq!(read_file(dir.path(), RESOURCE_DIR, &name).await.unwrap(), b"%PDF-1.4");
        remove_file(dir.path(), RESOURCE_DIR, &name).await;
        assert!(matches!(
            read_file(dir.path(), RESOURCE_DIR, &name).await,
            Err(AppError::NotFound(_))
        ));
        assert!(read_file(dir.path(), RESOURCE_DIR, "../secret").await.is_err());
    }
}
