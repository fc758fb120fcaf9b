//! File name derivation for optimized results

use std::path::Path;

/// Suffix inserted before the extension of an optimized file
pub const OPTIMIZED_SUFFIX: &str = "_optimized";

/// Name used when the upload carried no usable file name
pub const FALLBACK_DOWNLOAD_NAME: &str = "optimized-image.jpg";

/// Client-side name for a result whose source had no name at all
pub const FALLBACK_CLIENT_NAME: &str = "optimized-image";

/// Insert [`OPTIMIZED_SUFFIX`] before the extension of `original`
///
/// Only the final path component is used. `photo.png` becomes
/// `photo_optimized.png`, `photo` becomes `photo_optimized`. A leading dot
/// does not start an extension, so `.bashrc` becomes `.bashrc_optimized`.
/// An empty name becomes [`FALLBACK_CLIENT_NAME`].
pub fn optimized_file_name(original: &str) -> String {
    let name = file_component(original).trim();
    if name.is_empty() {
        return FALLBACK_CLIENT_NAME.to_string();
    }
    let path = Path::new(name);

    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name);

    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{}{}.{}", stem, OPTIMIZED_SUFFIX, ext),
        None => format!("{}{}", stem, OPTIMIZED_SUFFIX),
    }
}

/// Name advertised in the server's `Content-Disposition` header
///
/// The result is always a `.jpg` name restricted to `[A-Za-z0-9._-]` so it
/// can be placed in a quoted header parameter without escaping.
pub fn download_file_name(original: Option<&str>) -> String {
    let stem = original
        .map(file_component)
        .map(|name| {
            Path::new(name)
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or(name)
                .to_string()
        })
        .map(|stem| sanitize(&stem))
        .unwrap_or_default();

    if stem.trim_matches(|c| c == '_' || c == '.').is_empty() {
        return FALLBACK_DOWNLOAD_NAME.to_string();
    }

    format!("{}{}.jpg", stem, OPTIMIZED_SUFFIX)
}

fn file_component(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

fn sanitize(stem: &str) -> String {
    stem.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimized_file_name_inserts_suffix() {
        assert_eq!(optimized_file_name("photo.png"), "photo_optimized.png");
        assert_eq!(optimized_file_name("holiday.photo.jpeg"), "holiday.photo_optimized.jpeg");
    }

    #[test]
    fn test_optimized_file_name_without_extension() {
        assert_eq!(optimized_file_name("photo"), "photo_optimized");
    }

    #[test]
    fn test_optimized_file_name_dotfile_keeps_whole_name() {
        assert_eq!(optimized_file_name(".bashrc"), ".bashrc_optimized");
        assert_eq!(optimized_file_name(".hidden.png"), ".hidden_optimized.png");
    }

    #[test]
    fn test_optimized_file_name_empty() {
        assert_eq!(optimized_file_name(""), FALLBACK_CLIENT_NAME);
        assert_eq!(optimized_file_name("   "), FALLBACK_CLIENT_NAME);
        assert_eq!(optimized_file_name("shots/"), FALLBACK_CLIENT_NAME);
    }

    #[test]
    fn test_optimized_file_name_strips_directories() {
        assert_eq!(optimized_file_name("/tmp/shots/a.webp"), "a_optimized.webp");
        assert_eq!(optimized_file_name("C:\\shots\\b.jpg"), "b_optimized.jpg");
    }

    #[test]
    fn test_download_file_name() {
        assert_eq!(download_file_name(Some("cat.png")), "cat_optimized.jpg");
        assert_eq!(download_file_name(Some("my cat (1).webp")), "my_cat__1__optimized.jpg");
    }

    #[test]
    fn test_download_file_name_fallback() {
        assert_eq!(download_file_name(None), FALLBACK_DOWNLOAD_NAME);
        assert_eq!(download_file_name(Some("")), FALLBACK_DOWNLOAD_NAME);
        assert_eq!(download_file_name(Some("日本.png")), FALLBACK_DOWNLOAD_NAME);
    }
}
