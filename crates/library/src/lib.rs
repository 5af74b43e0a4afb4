//! # library
//!
//! Local mirror of Jenkins instances.
//!
//! A library root holds one directory per remote instance. Each instance
//! directory carries a `jenkins.properties` identity record (`name`, `url`)
//! and one flat collection of raw configuration blobs per entity kind:
//!
//! ```text
//! <root>/
//!   staging/
//!     jenkins.properties
//!     jobs/
//!       build-main
//!       deploy
//!     views/
//!     nodes/
//! ```
//!
//! Mirrors are provisioned out-of-band. This crate only reads the identity
//! record, enumerates and reads blobs, and writes blobs; it never deletes.

pub mod error;
pub mod properties;

pub use error::{Error, Result};

use std::fs;
use std::path::{Path, PathBuf};

/// File name of the identity record inside an instance directory
pub const PROPERTIES_FILE: &str = "jenkins.properties";

/// Per-kind blob collection inside an instance directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Jobs,
    Views,
    Nodes,
}

impl Collection {
    /// Directory name of the collection.
    pub fn dir_name(self) -> &'static str {
        match self {
            Collection::Jobs => "jobs",
            Collection::Views => "views",
            Collection::Nodes => "nodes",
        }
    }
}

/// One mirrored instance.
#[derive(Debug, Clone)]
pub struct Library {
    path: PathBuf,
    name: String,
    url: String,
}

impl Library {
    /// Open an existing instance directory and load its identity record.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let props_path = path.join(PROPERTIES_FILE);
        let content = fs::read_to_string(&props_path).map_err(|source| Error::Read {
            path: props_path.clone(),
            source,
        })?;

        let mut props = properties::parse(&content);
        let name = props.remove("name").ok_or_else(|| Error::MissingProperty {
            path: props_path.clone(),
            key: "name",
        })?;
        let url = props
            .remove("url")
            .filter(|u| !u.trim().is_empty())
            .ok_or(Error::MissingProperty {
                path: props_path,
                key: "url",
            })?;

        log::debug!("Opened library '{}' at {}", name, path.display());

        Ok(Self {
            path,
            name,
            url: normalize_url(url.trim()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Instance name from the identity record.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Base URL of the remote instance, always ending in `/`.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn collection_dir(&self, collection: Collection) -> PathBuf {
        self.path.join(collection.dir_name())
    }

    /// Entity names present in a collection, sorted.
    ///
    /// A collection directory that does not exist yet is empty.
    pub fn list(&self, collection: Collection) -> Result<Vec<String>> {
        let dir = self.collection_dir(collection);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&dir).map_err(|source| Error::Read {
            path: dir.clone(),
            source,
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| Error::Read {
                path: dir.clone(),
                source,
            })?;
            if entry.path().is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();

        Ok(names)
    }

    /// Read one entity blob.
    pub fn read(&self, collection: Collection, entity: &str) -> Result<String> {
        let path = self.entity_path(collection, entity)?;
        fs::read_to_string(&path).map_err(|source| Error::Read { path, source })
    }

    /// Write one entity blob, replacing any previous copy.
    pub fn write(&self, collection: Collection, entity: &str, content: &str) -> Result<PathBuf> {
        let path = self.entity_path(collection, entity)?;
        let dir = self.collection_dir(collection);
        fs::create_dir_all(&dir).map_err(|source| Error::Write {
            path: dir.clone(),
            source,
        })?;
        fs::write(&path, content).map_err(|source| Error::Write {
            path: path.clone(),
            source,
        })?;

        log::debug!("Wrote {}", path.display());
        Ok(path)
    }

    fn entity_path(&self, collection: Collection, entity: &str) -> Result<PathBuf> {
        if entity.is_empty()
            || entity == "."
            || entity == ".."
            || entity.contains(['/', '\\'])
        {
            return Err(Error::InvalidEntityName(entity.to_string()));
        }
        Ok(self.collection_dir(collection).join(entity))
    }
}

/// Directory holding one mirror per remote instance.
#[derive(Debug, Clone)]
pub struct LibraryRoot {
    path: PathBuf,
}

impl LibraryRoot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the instance stored under `relative` (usually its name).
    pub fn open(&self, relative: &str) -> Result<Library> {
        Library::open(self.path.join(relative))
    }

    /// All instance directories that carry an identity record, sorted by
    /// directory name. Directories without one are ignored.
    pub fn libraries(&self) -> Result<Vec<Library>> {
        let entries = fs::read_dir(&self.path).map_err(|source| Error::Read {
            path: self.path.clone(),
            source,
        })?;

        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.join(PROPERTIES_FILE).is_file())
            .collect();
        dirs.sort();

        let mut libraries = Vec::with_capacity(dirs.len());
        for dir in dirs {
            match Library::open(&dir) {
                Ok(library) => libraries.push(library),
                Err(e) => log::warn!("Skipping {}: {}", dir.display(), e),
            }
        }

        Ok(libraries)
    }

    /// Find the mirror whose recorded URL is `url`.
    pub fn find_by_url(&self, url: &str) -> Result<Option<Library>> {
        let wanted = normalize_url(url);
        Ok(self.libraries()?.into_iter().find(|l| l.url == wanted))
    }
}

fn normalize_url(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

// ============================================================================
// Tests
// ============================================================================
