//! Image extraction.
//!
//! Every `<img>` tag is lifted out of the HTML and replaced by a placeholder
//! block that the front end later swaps for the image chunk. Local images get
//! an inline preview and a reserved aspect ratio.
//!
//! Tags are matched with regular expressions, which is only sound for HTML
//! produced by `folio-renderer`. Hand-written HTML with `>` inside attribute
//! values will not be handled.

use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::lqip::{self, Lqip};

static IMG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?is)<img\b[^>]*>").unwrap());

static SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bsrc\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).unwrap()
});

/// An `<img>` tag lifted out of the HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    /// Placeholder id (`ph0`, `ph1`, ...).
    pub placeholder_id: String,
    /// Original tag, verbatim.
    pub html: String,
}

/// Where local image sources are looked up.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ImageLocations<'a> {
    /// Directory of the document, for relative sources.
    pub base_dir: Option<&'a Path>,
    /// Public web root, for `/`-prefixed sources.
    pub public_dir: Option<&'a Path>,
}

impl ImageLocations<'_> {
    /// Resolve an image source to an existing local file.
    ///
    /// Remote URLs, protocol-relative URLs and `data:` payloads have no
    /// local file.
    pub fn resolve(&self, src: &str) -> Option<PathBuf> {
        let src = src.trim();
        if src.is_empty() || src.starts_with("//") || has_scheme(src) {
            return None;
        }
        // Query strings and fragments are not part of the file name.
        let src = src.split(['?', '#']).next().unwrap_or(src);

        let path = match src.strip_prefix('/') {
            Some(rooted) => self.public_dir?.join(rooted.trim_start_matches('/')),
            None => self.base_dir?.join(src),
        };
        path.is_file().then_some(path)
    }
}

fn has_scheme(src: &str) -> bool {
    let lower = src.to_ascii_lowercase();
    ["data:", "http:", "https:", "ftp:", "blob:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

/// Source attribute of an `<img>` tag, entity-decoded.
pub(crate) fn image_src(tag: &str) -> Option<String> {
    let caps = SRC_RE.captures(tag)?;
    let raw = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3))?;
    Some(html_escape::decode_html_entities(raw.as_str()).into_owned())
}

/// Replace every image in `html` with a placeholder.
///
/// Returns the rewritten HTML and the images in order of appearance.
pub(crate) fn extract_images(
    html: &str,
    locations: ImageLocations<'_>,
    lqip_width: u32,
    lqip_quality: u8,
) -> (String, Vec<ExtractedImage>) {
    let mut images = Vec::new();

    let replaced = IMG_RE.replace_all(html, |caps: &Captures<'_>| {
        let tag = &caps[0];
        let placeholder_id = format!("ph{}", images.len());

        let preview = image_src(tag)
            .and_then(|src| locations.resolve(&src))
            .and_then(|path| match lqip::generate(&path, lqip_width, lqip_quality) {
                Ok(lqip) => Some(lqip),
                Err(e) => {
                    tracing::debug!(path = %path.display(), error = %e, "Image preview skipped");
                    None
                }
            });

        let placeholder = placeholder_html(&placeholder_id, preview.as_ref());
        images.push(ExtractedImage {
            placeholder_id,
            html: tag.to_owned(),
        });
        placeholder
    });

    (replaced.into_owned(), images)
}

/// Markup standing in for an extracted image.
pub(crate) fn placeholder_html(placeholder_id: &str, preview: Option<&Lqip>) -> String {
    let mut html = format!(r#"<div class="img-ph" data-ph="{placeholder_id}""#);
    if let Some(preview) = preview {
        write!(html, r#" data-lqip="{}""#, preview.data_uri).unwrap();
        write!(
            html,
            concat!(
                r#" style="aspect-ratio: {} / {}; background-image: url('{}'); "#,
                r#"background-size: cover; background-position: center; filter: blur(14px)""#
            ),
            preview.width, preview.height, preview.data_uri
        )
        .unwrap();
    }
    html.push_str(r#"><div class="lazy-spinner"></div></div>"#);
    html
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    const NOWHERE: ImageLocations<'static> = ImageLocations {
        base_dir: None,
        public_dir: None,
    };

    #[test]
    fn test_image_src_quote_styles() {
        assert_eq!(image_src(r#"<img src="a.png" alt="x">"#).as_deref(), Some("a.png"));
        assert_eq!(image_src("<img src='b.png'>").as_deref(), Some("b.png"));
        assert_eq!(image_src("<img SRC=c.png>").as_deref(), Some("c.png"));
        assert_eq!(
            image_src(r#"<img src="a&amp;b.png">"#).as_deref(),
            Some("a&b.png")
        );
        assert_eq!(image_src(r#"<img alt="none">"#), None);
    }

    #[test]
    fn test_placeholder_ids_in_document_order() {
        let html = r#"<p><img src="a.png"></p><p><img src="https://x/b.png"><IMG src="c.png"></p>"#;
        let (text, images) = extract_images(html, NOWHERE, 24, 30);

        let ids: Vec<_> = images.iter().map(|i| i.placeholder_id.as_str()).collect();
        assert_eq!(ids, vec!["ph0", "ph1", "ph2"]);
        assert_eq!(images[1].html, r#"<img src="https://x/b.png">"#);
        assert_eq!(images[2].html, r#"<IMG src="c.png">"#);
        assert!(!text.contains("<img"));
        assert!(text.contains(r#"data-ph="ph2""#));
    }

    #[test]
    fn test_placeholder_without_preview() {
        assert_eq!(
            placeholder_html("ph3", None),
            r#"<div class="img-ph" data-ph="ph3"><div class="lazy-spinner"></div></div>"#
        );
    }

    #[test]
    fn test_placeholder_with_preview() {
        let preview = Lqip {
            data_uri: "data:image/jpeg;base64,AAAA".to_owned(),
            width: 640,
            height: 480,
        };
        assert_eq!(
            placeholder_html("ph0", Some(&preview)),
            concat!(
                r#"<div class="img-ph" data-ph="ph0" data-lqip="data:image/jpeg;base64,AAAA" "#,
                r#"style="aspect-ratio: 640 / 480; background-image: url('data:image/jpeg;base64,AAAA'); "#,
                r#"background-size: cover; background-position: center; filter: blur(14px)">"#,
                r#"<div class="lazy-spinner"></div></div>"#
            )
        );
    }

    #[test]
    fn test_resolve_skips_remote_and_inline() {
        let dir = TempDir::new().unwrap();
        let locations = ImageLocations {
            base_dir: Some(dir.path()),
            public_dir: Some(dir.path()),
        };
        for src in [
            "https://example.com/a.png",
            "HTTP://example.com/a.png",
            "//cdn.example.com/a.png",
            "data:image/png;base64,AAAA",
            "",
        ] {
            assert_eq!(locations.resolve(src), None, "{src}");
        }
    }

    #[test]
    fn test_resolve_local_paths() {
        let docs = TempDir::new().unwrap();
        let public = TempDir::new().unwrap();
        std::fs::write(docs.path().join("local.png"), b"x").unwrap();
        std::fs::create_dir_all(public.path().join("static")).unwrap();
        std::fs::write(public.path().join("static/logo.png"), b"x").unwrap();

        let locations = ImageLocations {
            base_dir: Some(docs.path()),
            public_dir: Some(public.path()),
        };

        assert_eq!(
            locations.resolve("local.png?v=2"),
            Some(docs.path().join("local.png"))
        );
        assert_eq!(
            locations.resolve("/static/logo.png"),
            Some(public.path().join("static/logo.png"))
        );
        assert_eq!(locations.resolve("missing.png"), None);

        let without_public = ImageLocations {
            public_dir: None,
            ..locations
        };
        assert_eq!(without_public.resolve("/static/logo.png"), None);
    }

    #[test]
    fn test_local_image_gets_preview() {
        let dir = TempDir::new().unwrap();
        RgbImage::from_pixel(40, 20, Rgb([0, 128, 255]))
            .save(dir.path().join("local.png"))
            .unwrap();
        std::fs::write(dir.path().join("broken.png"), b"nope").unwrap();

        let locations = ImageLocations {
            base_dir: Some(dir.path()),
            public_dir: None,
        };
        let html = r#"<img src="local.png" alt="ok"><img src="broken.png">"#;
        let (text, images) = extract_images(html, locations, 24, 30);

        assert_eq!(images.len(), 2);
        assert!(text.contains(r#"data-ph="ph0" data-lqip="data:image/jpeg;base64,"#));
        assert!(text.contains("aspect-ratio: 40 / 20"));
        assert!(text.contains(
            r#"<div class="img-ph" data-ph="ph1"><div class="lazy-spinner"></div></div>"#
        ));
    }
}
