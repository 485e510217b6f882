//! Relative asset paths
//!
//! Image sources relative to the document are rewritten to the
//! application resource scheme rooted at the document's directory. The
//! rewrite walks `img` elements in the tree, so sources inside raw HTML
//! blocks are handled the same way and no other attribute is touched.
//!
//! Locators are percent-encoded URLs, so output written outside the viewer
//! maps them onto `file:` URLs with [`resource_file_url`].

use crate::dom::{Dom, NodeId};
use std::path::Path;
use url::Url;

/// Application-internal resource locator prefix
pub const ASSET_SCHEME: &str = "printdown:///";

/// Schemes that never need a `//` authority to count as absolute
const KNOWN_SCHEMES: &[&str] = &["http", "https", "file", "data", "blob", "mailto", "printdown"];

fn is_drive_letter(src: &str) -> bool {
    let bytes = src.as_bytes();
    bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes.len() == 2 || matches!(bytes[2], b'/' | b'\\'))
}

/// Whether `src` already points somewhere absolute
///
/// A known scheme (`https:`, `data:`, `printdown:`) or any `scheme://`,
/// drive-letter (`C:\`), UNC (`\\host`, `//host`) and
/// filesystem-absolute (`/a`). A file name such as `fig:1.png` is relative.
pub fn is_absolute_src(src: &str) -> bool {
    if src.starts_with('/') || src.starts_with('\\') || is_drive_letter(src) {
        return true;
    }
    let Some((scheme, rest)) = src.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    let valid = chars.next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false)
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid
        && (KNOWN_SCHEMES.iter().any(|known| scheme.eq_ignore_ascii_case(known)) || rest.starts_with("//"))
}

fn collapse_separators(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len());
    for c in path.chars().map(|c| if c == '\\' { '/' } else { c }) {
        if c == '/' && normalized.ends_with('/') {
            continue;
        }
        normalized.push(c);
    }
    normalized
}

/// `file:` URL of a directory; drive-letter paths work on every platform
fn directory_url(base_dir: &Path) -> Option<Url> {
    Url::from_directory_path(base_dir).ok().or_else(|| {
        let dir = collapse_separators(&base_dir.to_string_lossy());
        Url::parse(&format!("file:///{}/", dir.trim_matches('/'))).ok()
    })
}

/// Resource locator for a relative `src` under `base_dir`
///
/// `src` is a URL reference: `..` segments are resolved and any query or
/// fragment is kept.
pub fn resolve_asset(base_dir: &Path, src: &str) -> String {
    let mut src = collapse_separators(src);
    // `fig:1.png` would otherwise parse as a URL with scheme `fig`
    if src.split('/').next().map(|first| first.contains(':')).unwrap_or(false) {
        src.insert_str(0, "./");
    }
    match directory_url(base_dir).and_then(|base| base.join(&src).ok()) {
        Some(url) => {
            let path = url.as_str().trim_start_matches("file:").trim_start_matches('/');
            format!("{}{}", ASSET_SCHEME, path)
        }
        None => {
            let joined = collapse_separators(&format!("{}/{}", base_dir.to_string_lossy(), src));
            format!("{}{}", ASSET_SCHEME, joined.trim_start_matches('/'))
        }
    }
}

/// `file:` URL for an application resource locator; `None` for any other source
pub fn resource_file_url(locator: &str) -> Option<String> {
    locator
        .strip_prefix(ASSET_SCHEME)
        .map(|path| format!("file:///{}", path))
}

/// Rewrite relative `img` sources under `scope`; returns the number rewritten
pub fn rewrite_image_sources(dom: &mut Dom, scope: NodeId, base_dir: &Path) -> usize {
    let mut rewritten = 0;
    for img in dom.select(scope, |e| e.is("img")) {
        let Some(src) = dom.attr(img, "src").map(str::to_string) else {
            continue;
        };
        if src.is_empty() || is_absolute_src(&src) {
            continue;
        }
        let resolved = resolve_asset(base_dir, &src);
        log::debug!("Image source {} -> {}", src, resolved);
        dom.set_attr(img, "src", resolved);
        rewritten += 1;
    }
    rewritten
}
