//! Flat directory listing using walkdir.

use super::filter::{EntryFilter, IMAGE_EXTENSIONS};
use super::{Collection, Corpus, CorpusLoader, FileRef};
use crate::error::CorpusError;
use crate::events::{CorpusEvent, Event, EventSender};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Configuration for the collection loader
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Whether to include hidden files
    pub include_hidden: bool,
    /// Extensions to include (None = every regular file)
    pub extensions: Option<Vec<String>>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            include_hidden: true,
            extensions: None,
        }
    }
}

impl LoaderConfig {
    /// Restrict the listing to known image extensions
    pub fn images_only(mut self) -> Self {
        self.extensions = Some(IMAGE_EXTENSIONS.iter().map(|e| e.to_string()).collect());
        self
    }
}

/// Loader that lists the regular files directly under a directory
pub struct DirCorpusLoader {
    filter: EntryFilter,
}

impl DirCorpusLoader {
    /// Create a new loader with the given configuration
    pub fn new(config: LoaderConfig) -> Self {
        let mut filter = EntryFilter::new().with_hidden(config.include_hidden);

        if let Some(extensions) = config.extensions {
            filter = filter.with_extensions(extensions);
        }

        Self { filter }
    }

    fn check_root(root: &Path) -> Result<(), CorpusError> {
        let metadata = fs::metadata(root).map_err(|e| CorpusError::PathUnreadable {
            path: root.to_path_buf(),
            reason: e.to_string(),
        })?;

        if !metadata.is_dir() {
            return Err(CorpusError::PathUnreadable {
                path: root.to_path_buf(),
                reason: "not a directory".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for DirCorpusLoader {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

impl CorpusLoader for DirCorpusLoader {
    fn load(&self, root: &Path, collection: Collection) -> Result<Corpus, CorpusError> {
        self.load_with_events(root, collection, &crate::events::null_sender())
    }

    fn load_with_events(
        &self,
        root: &Path,
        collection: Collection,
        events: &EventSender,
    ) -> Result<Corpus, CorpusError> {
        Self::check_root(root)?;

        events.send(Event::Corpus(CorpusEvent::Started {
            collection,
            root: root.to_path_buf(),
        }));

        let mut files = Vec::new();

        // Links are followed so a symlink to a file counts as a file and a
        // symlink to a directory is skipped like any other directory.
        let walker = WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true);

        for entry_result in walker {
            match entry_result {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        continue;
                    }

                    let path = entry.path();
                    if !self.filter.should_include(path) {
                        debug!(path = %path.display(), "filtered out");
                        continue;
                    }

                    files.push(FileRef::new(collection, path));
                }
                Err(e) if e.depth() == 0 => {
                    return Err(CorpusError::PathUnreadable {
                        path: root.to_path_buf(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                    events.send(Event::Corpus(CorpusEvent::Skipped {
                        path,
                        message: e.to_string(),
                    }));
                }
            }
        }

        debug!(%collection, root = %root.display(), files = files.len(), "collection listed");

        events.send(Event::Corpus(CorpusEvent::Loaded {
            collection,
            files: files.len(),
        }));

        Ok(Corpus {
            collection,
            root: root.to_path_buf(),
            files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventChannel;
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    #[test]
    fn empty_directory_yields_empty_corpus() {
        let temp_dir = TempDir::new().unwrap();
        let loader = DirCorpusLoader::default();

        let corpus = loader.load(temp_dir.path(), Collection::A).unwrap();

        assert!(corpus.is_empty());
        assert_eq!(corpus.collection(), Collection::A);
    }

    #[test]
    fn lists_regular_files_of_any_type() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "photo.jpg", b"foo");
        create_file(temp_dir.path(), "notes.txt", b"bar");

        let loader = DirCorpusLoader::default();
        let corpus = loader.load(temp_dir.path(), Collection::B).unwrap();

        assert_eq!(corpus.len(), 2);
        assert!(corpus.files().iter().all(|f| f.collection == Collection::B));
    }

    #[test]
    fn subdirectories_are_skipped_not_descended() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "top.jpg", b"foo");

        let nested = temp_dir.path().join("nested");
        fs::create_dir(&nested).unwrap();
        create_file(&nested, "inner.jpg", b"foo");

        let loader = DirCorpusLoader::default();
        let corpus = loader.load(temp_dir.path(), Collection::A).unwrap();

        assert_eq!(corpus.len(), 1);
        assert!(corpus.files()[0].path.ends_with("top.jpg"));
    }

    #[test]
    fn missing_root_is_unreadable() {
        let loader = DirCorpusLoader::default();
        let result = loader.load(Path::new("/nonexistent/path/12345"), Collection::A);

        assert!(matches!(result, Err(CorpusError::PathUnreadable { .. })));
    }

    #[test]
    fn file_root_is_unreadable() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_file(temp_dir.path(), "plain.jpg", b"foo");

        let loader = DirCorpusLoader::default();
        let err = loader.load(&file, Collection::A).unwrap_err();

        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn filter_config_is_applied() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "keep.png", b"foo");
        create_file(temp_dir.path(), "drop.txt", b"bar");
        create_file(temp_dir.path(), ".hidden.png", b"baz");

        let loader = DirCorpusLoader::new(LoaderConfig {
            include_hidden: false,
            extensions: Some(vec!["png".to_string()]),
        });
        let corpus = loader.load(temp_dir.path(), Collection::A).unwrap();

        assert_eq!(corpus.len(), 1);
        assert!(corpus.files()[0].path.ends_with("keep.png"));
    }

    #[test]
    fn images_only_config_drops_other_files() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "photo.JPG", b"foo");
        create_file(temp_dir.path(), "notes.txt", b"bar");

        let loader = DirCorpusLoader::new(LoaderConfig::default().images_only());
        let corpus = loader.load(temp_dir.path(), Collection::A).unwrap();

        assert_eq!(corpus.len(), 1);
        assert!(corpus.files()[0].path.ends_with("photo.JPG"));
    }

    #[test]
    fn emits_loaded_event() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "x.jpg", b"foo");

        let (sender, receiver) = EventChannel::new();
        DirCorpusLoader::default()
            .load_with_events(temp_dir.path(), Collection::A, &sender)
            .unwrap();
        drop(sender);

        let loaded = receiver.iter().any(|e| {
            matches!(
                e,
                Event::Corpus(CorpusEvent::Loaded {
                    collection: Collection::A,
                    files: 1
                })
            )
        });
        assert!(loaded);
    }
}
