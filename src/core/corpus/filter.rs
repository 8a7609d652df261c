//! Entry filtering for the corpus loader.

use std::collections::HashSet;
use std::path::Path;

/// Extensions accepted by `LoaderConfig::images_only`
pub(super) const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff", "tif",
];

/// Decides which regular files become part of a corpus.
///
/// The default accepts every file, so non-image content still reaches the
/// engine and shows up as a failed comparison instead of disappearing.
#[derive(Debug, Clone)]
pub struct EntryFilter {
    /// Lowercase extensions to accept (None = any)
    extensions: Option<HashSet<String>>,
    /// Whether to include dot-files
    include_hidden: bool,
}

impl EntryFilter {
    /// Accept every file
    pub fn new() -> Self {
        Self {
            extensions: None,
            include_hidden: true,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Restrict to the given extensions (matched case-insensitively)
    pub fn with_extensions<I>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.extensions = Some(
            extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        );
        self
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        if !self.include_hidden {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    return false;
                }
            }
        }

        match &self.extensions {
            None => true,
            Some(allowed) => path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| allowed.contains(&e.to_lowercase()))
                .unwrap_or(false),
        }
    }
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_accepts_everything() {
        let filter = EntryFilter::new();
        assert!(filter.should_include(Path::new("/a/notes.txt")));
        assert!(filter.should_include(Path::new("/a/.hidden.jpg")));
        assert!(filter.should_include(Path::new("/a/no_extension")));
    }

    #[test]
    fn image_extensions_match_case_insensitively() {
        let filter =
            EntryFilter::new().with_extensions(IMAGE_EXTENSIONS.iter().map(|e| e.to_string()));
        assert!(filter.should_include(Path::new("/a/IMG_1234.JPG")));
        assert!(filter.should_include(Path::new("/a/scan.tif")));
        assert!(!filter.should_include(Path::new("/a/video.mp4")));
        assert!(!filter.should_include(Path::new("/a/no_extension")));
    }

    #[test]
    fn hidden_files_can_be_excluded() {
        let filter = EntryFilter::new().with_hidden(false);
        assert!(!filter.should_include(Path::new("/a/.DS_Store")));
        assert!(filter.should_include(Path::new("/a/visible.png")));
    }

    #[test]
    fn extensions_accept_leading_dot() {
        let filter = EntryFilter::new().with_extensions(vec![".PNG".to_string()]);
        assert!(filter.should_include(Path::new("/a/x.png")));
        assert!(!filter.should_include(Path::new("/a/x.jpg")));
    }
}
