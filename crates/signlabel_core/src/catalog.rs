//! Image catalog loading.
//!
//! # Responsibility
//! - Load the ordered list of image identifiers from a list file or a
//!   directory walk.
//! - Build display URLs and sample per-category example images.
//!
//! # Invariants
//! - Identifiers are trimmed and non-empty; list order is preserved.
//! - Directory identifiers use `/` separators relative to the root and
//!   are sorted for deterministic order.

use crate::model::label::ImageId;
use log::{error, info, warn};
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

static IMAGE_EXTENSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(jpe?g|png)$").expect("valid image extension regex"));

/// Where the catalog comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogSource {
    /// Newline-delimited identifiers.
    List(PathBuf),
    /// Recursive scan for `.jpg/.jpeg/.png` files.
    Directory(PathBuf),
}

#[derive(Debug)]
pub enum CatalogError {
    SourceNotFound(PathBuf),
    NotADirectory(PathBuf),
    Io { path: PathBuf, message: String },
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceNotFound(path) => write!(f, "catalog source not found: {}", path.display()),
            Self::NotADirectory(path) => write!(f, "not a directory: {}", path.display()),
            Self::Io { path, message } => {
                write!(f, "cannot read catalog `{}`: {message}", path.display())
            }
        }
    }
}

impl Error for CatalogError {}

/// Static ordered list of image identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    images: Vec<ImageId>,
}

impl Catalog {
    pub fn new(images: Vec<ImageId>) -> Self {
        Self { images }
    }

    pub fn images(&self) -> &[ImageId] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn contains(&self, image: &str) -> bool {
        self.images.iter().any(|candidate| candidate == image)
    }

    pub fn load(source: &CatalogSource) -> Result<Self, CatalogError> {
        match source {
            CatalogSource::List(path) => Self::from_list_file(path),
            CatalogSource::Directory(path) => Self::from_directory(path),
        }
    }

    /// Loads the catalog, degrading to an empty one on any error.
    ///
    /// An empty catalog means nothing is presentable; the error is logged
    /// as a configuration problem.
    pub fn load_or_empty(source: &CatalogSource) -> Self {
        match Self::load(source) {
            Ok(catalog) => catalog,
            Err(err) => {
                error!(
                    "event=catalog_load module=catalog status=error error_code=catalog_config error={err}"
                );
                Self::default()
            }
        }
    }

    /// Reads one identifier per line; blank lines are skipped.
    pub fn from_list_file(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            return Err(CatalogError::SourceNotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|err| CatalogError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let catalog = Self::from_lines(&text);
        info!(
            "event=catalog_load module=catalog status=ok mode=list images={}",
            catalog.len()
        );
        Ok(catalog)
    }

    pub fn from_lines(text: &str) -> Self {
        let images = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { images }
    }

    /// Walks `root` recursively and collects image files.
    pub fn from_directory(root: &Path) -> Result<Self, CatalogError> {
        let images = list_images(root, None)?;
        info!(
            "event=catalog_load module=catalog status=ok mode=directory images={}",
            images.len()
        );
        Ok(Self { images })
    }
}

/// Whether `name` carries one of the accepted image extensions.
pub fn is_image_file(name: &str) -> bool {
    IMAGE_EXTENSION_RE.is_match(name)
}

/// Joins the image base URL and an identifier with exactly one `/`.
pub fn image_url(base_url: &str, image: &str) -> String {
    if base_url.is_empty() {
        return image.to_string();
    }
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        image.trim_start_matches('/')
    )
}

/// Picks up to `count` random example images for one category.
///
/// Examples live in `<examples_dir>/<category_key>/`; a missing directory
/// yields no examples.
pub fn sample_examples<R: Rng + ?Sized>(
    examples_dir: &Path,
    category_key: &str,
    count: usize,
    rng: &mut R,
) -> Vec<PathBuf> {
    let dir = examples_dir.join(category_key);
    if !dir.is_dir() {
        return Vec::new();
    }
    match list_images(&dir, Some(1)) {
        Ok(images) => images
            .choose_multiple(rng, count)
            .map(|image| dir.join(image))
            .collect(),
        Err(err) => {
            warn!("event=examples_load module=catalog status=error category={category_key} error={err}");
            Vec::new()
        }
    }
}

fn list_images(root: &Path, max_depth: Option<usize>) -> Result<Vec<ImageId>, CatalogError> {
    if !root.exists() {
        return Err(CatalogError::SourceNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(CatalogError::NotADirectory(root.to_path_buf()));
    }

    let mut images = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .max_depth(max_depth.unwrap_or(usize::MAX));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("event=catalog_walk module=catalog status=error error={err}");
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_image_file(&entry.file_name().to_string_lossy()) {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let id = relative
            .components()
            .map(|part| part.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        images.push(id);
    }
    images.sort();
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::{image_url, is_image_file, Catalog};

    #[test]
    fn from_lines_trims_and_skips_blank_lines() {
        let catalog = Catalog::from_lines("a/1.jpg\n\n  b/2.png  \n\r\n");
        assert_eq!(catalog.images(), &["a/1.jpg".to_string(), "b/2.png".to_string()]);
    }

    #[test]
    fn image_extensions_are_case_insensitive() {
        assert!(is_image_file("sign.JPG"));
        assert!(is_image_file("sign.jpeg"));
        assert!(is_image_file("sign.png"));
        assert!(!is_image_file("sign.gif"));
        assert!(!is_image_file("png"));
    }

    #[test]
    fn image_url_joins_with_single_slash() {
        assert_eq!(image_url("https://cdn/x/", "/a.jpg"), "https://cdn/x/a.jpg");
        assert_eq!(image_url("https://cdn/x", "a.jpg"), "https://cdn/x/a.jpg");
        assert_eq!(image_url("", "a.jpg"), "a.jpg");
    }
}
