//! # Corpus Module
//!
//! Lists the files of one collection root.
//!
//! Only entries directly under the root are considered. Subdirectories are
//! skipped, never descended into, and the listing keeps whatever order the
//! directory enumeration yields.
//!
//! ## Example
//! ```rust,ignore
//! use image_crossmatch::core::corpus::{Collection, CorpusLoader, DirCorpusLoader, LoaderConfig};
//!
//! let loader = DirCorpusLoader::new(LoaderConfig::default());
//! let corpus = loader.load(Path::new("/photos/old"), Collection::A)?;
//! ```

mod filter;
mod walker;

pub use filter::EntryFilter;
pub use walker::{DirCorpusLoader, LoaderConfig};

use crate::error::CorpusError;
use crate::events::EventSender;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which side of the comparison a file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Collection {
    A,
    B,
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Collection::A => write!(f, "A"),
            Collection::B => write!(f, "B"),
        }
    }
}

/// A file within one collection
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRef {
    /// Collection the file was listed from
    pub collection: Collection,
    /// Path as enumerated (root joined with the entry name)
    pub path: PathBuf,
}

impl FileRef {
    pub fn new(collection: Collection, path: impl Into<PathBuf>) -> Self {
        Self {
            collection,
            path: path.into(),
        }
    }
}

/// The ordered, immutable file list of one collection
#[derive(Debug, Clone)]
pub struct Corpus {
    collection: Collection,
    root: PathBuf,
    files: Vec<FileRef>,
}

impl Corpus {
    /// Build a corpus from already-enumerated paths.
    ///
    /// Useful for tests and for callers that do their own listing.
    pub fn from_paths<I, P>(collection: Collection, root: impl Into<PathBuf>, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            collection,
            root: root.into(),
            files: paths
                .into_iter()
                .map(|p| FileRef::new(collection, p))
                .collect(),
        }
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[FileRef] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Trait for collection loaders
///
/// Implement this to list collections from somewhere other than a local
/// directory, then hand it to `PipelineBuilder::corpus_loader`.
pub trait CorpusLoader: Send + Sync {
    /// List the files of one collection root
    fn load(&self, root: &Path, collection: Collection) -> Result<Corpus, CorpusError>;

    /// List with progress reporting via events
    fn load_with_events(
        &self,
        root: &Path,
        collection: Collection,
        events: &EventSender,
    ) -> Result<Corpus, CorpusError>;
}
