// crates/evidence-gate-core/src/core/pack.rs
// ============================================================================
// Module: Evidence Pack Integrity
// Description: Pack indexing, root hashing, and integrity artifact storage.
// Purpose: Fold a directory of evidence files into one reproducible root hash.
// Dependencies: crate::core::hashing, serde, thiserror
// ============================================================================

//! ## Overview
//! A pack is hashed in three steps. [`PackIndexer`] walks the directory and
//! drops excluded directories and OS metadata files. [`PackRootHasher`] hashes
//! every remaining file, sorts the entries by byte-wise path order, and
//! hashes the [`SumsDocument`] hash input. The hash input is the rendered
//! lines joined by `\n` with no trailing newline; the persisted
//! `sha256sums.txt` does carry the trailing newline.
//!
//! ## Invariants
//! - Entry paths are relative, forward-slash separated, and unique.
//! - Traversal order never affects the result; only the final sort does.
//! - Integrity artifacts are replaced atomically (stage then rename).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::thread;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::hashing::HashError;
use crate::core::hashing::hash_bytes;
use crate::core::hashing::hash_file;
use crate::core::hashing::is_sha256_hex;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Directory holding the integrity artifacts of a pack.
pub const INTEGRITY_DIR: &str = "integrity";
/// File name of the persisted sums document.
pub const SUMS_FILE: &str = "sha256sums.txt";
/// File name of the persisted root hash.
pub const ROOT_HASH_FILE: &str = "pack.sha256";
/// Directory names excluded from every pack by default.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[INTEGRITY_DIR];
/// OS artifact file names excluded from every pack by default.
pub const DEFAULT_EXCLUDED_FILES: &[&str] = &[".DS_Store", "Thumbs.db", ".gitkeep"];
/// Default upper bound on concurrent file reads while hashing.
pub const DEFAULT_MAX_PARALLEL_READS: usize = 8;
/// Separator between hash and path in a sums line.
const SUMS_SEPARATOR: &str = "  ";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while indexing, hashing, or persisting a pack.
#[derive(Debug, Error)]
pub enum PackError {
    /// Pack root is missing or not a directory.
    #[error("pack directory not found: {0}")]
    MissingRoot(PathBuf),
    /// Directory listing failed.
    #[error("failed to list {path}: {source}")]
    Walk {
        /// Directory that failed to list.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Path component is not valid UTF-8.
    #[error("path is not valid utf-8: {0}")]
    NonUtf8Path(PathBuf),
    /// File hashing failed.
    #[error(transparent)]
    Hash(#[from] HashError),
    /// Integrity artifact could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Target path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Integrity artifact could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Source path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Integrity artifact is malformed.
    #[error("malformed integrity artifact {path}: {reason}")]
    Malformed {
        /// Artifact path.
        path: PathBuf,
        /// Description of the defect.
        reason: String,
    },
    /// Sums document contains the same path twice.
    #[error("duplicate pack path: {0}")]
    DuplicatePath(String),
    /// A hashing worker thread panicked.
    #[error("pack hashing worker failed")]
    Worker,
}

// ============================================================================
// SECTION: Data Model
// ============================================================================

/// One hashed file within a pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Forward-slash path relative to the pack root.
    pub path: String,
    /// Lowercase hex SHA-256 of the file bytes.
    pub hash: String,
}

impl FileEntry {
    /// Renders the entry as a sums line without newline.
    #[must_use]
    pub fn line(&self) -> String {
        format!("{}{SUMS_SEPARATOR}{}", self.hash, self.path)
    }
}

/// Sorted, duplicate-free list of file entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SumsDocument {
    /// Entries in byte-wise path order.
    entries: Vec<FileEntry>,
}

impl SumsDocument {
    /// Builds a document, sorting entries by byte-wise path order.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::DuplicatePath`] when a path appears twice.
    pub fn new(mut entries: Vec<FileEntry>) -> Result<Self, PackError> {
        entries.sort_by(|a, b| a.path.as_bytes().cmp(b.path.as_bytes()));
        if let Some(pair) = entries.windows(2).find(|pair| pair[0].path == pair[1].path) {
            return Err(PackError::DuplicatePath(pair[0].path.clone()));
        }
        Ok(Self {
            entries,
        })
    }

    /// Returns the entries in canonical order.
    #[must_use]
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the document has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the bytes hashed into the root hash (no trailing newline).
    #[must_use]
    pub fn hash_input(&self) -> String {
        self.entries.iter().map(FileEntry::line).collect::<Vec<_>>().join("\n")
    }

    /// Returns the persisted rendering (trailing newline when non-empty).
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.line());
            out.push('\n');
        }
        out
    }

    /// Computes the root hash over [`Self::hash_input`].
    #[must_use]
    pub fn root_hash(&self) -> String {
        hash_bytes(self.hash_input().as_bytes())
    }

    /// Parses a persisted sums document.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Malformed`] for lines that are not
    /// `<64-hex>  <path>`, or [`PackError::DuplicatePath`].
    pub fn parse(text: &str, source: &Path) -> Result<Self, PackError> {
        let mut entries = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let Some((hash, path)) = line.split_once(SUMS_SEPARATOR) else {
                return Err(PackError::Malformed {
                    path: source.to_path_buf(),
                    reason: format!("line {} is missing the hash separator", index + 1),
                });
            };
            if !is_sha256_hex(hash) || path.is_empty() {
                return Err(PackError::Malformed {
                    path: source.to_path_buf(),
                    reason: format!("line {} is not a sha256 entry", index + 1),
                });
            }
            entries.push(FileEntry {
                path: path.to_string(),
                hash: hash.to_string(),
            });
        }
        Self::new(entries)
    }
}

/// Result of hashing a pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackDigest {
    /// Sorted file entries.
    pub entries: SumsDocument,
    /// Root hash over the sums hash input.
    pub root_hash: String,
}

/// Entry-level differences between two sums documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SumsDiff {
    /// Paths only in the recomputed document.
    pub added: Vec<String>,
    /// Paths only in the stored document.
    pub removed: Vec<String>,
    /// Paths present in both with differing hashes.
    pub changed: Vec<String>,
}

impl SumsDiff {
    /// Returns true when the documents agree.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Compares a stored sums document with a recomputed one.
#[must_use]
pub fn diff_sums(stored: &SumsDocument, computed: &SumsDocument) -> SumsDiff {
    let stored_map: BTreeMap<&str, &str> =
        stored.entries().iter().map(|e| (e.path.as_str(), e.hash.as_str())).collect();
    let computed_map: BTreeMap<&str, &str> =
        computed.entries().iter().map(|e| (e.path.as_str(), e.hash.as_str())).collect();
    let mut diff = SumsDiff::default();
    for (path, hash) in &computed_map {
        match stored_map.get(path) {
            None => diff.added.push((*path).to_string()),
            Some(stored_hash) if stored_hash != hash => diff.changed.push((*path).to_string()),
            Some(_) => {}
        }
    }
    for path in stored_map.keys() {
        if !computed_map.contains_key(path) {
            diff.removed.push((*path).to_string());
        }
    }
    diff
}

/// Comparison of a stored root hash against a recomputed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackVerificationStatus {
    /// Stored and recomputed hashes are identical.
    Match,
    /// Stored hash differs from the recomputed value.
    Mismatch,
    /// No stored hash exists.
    NoStoredHash,
}

/// Outcome of [`PackRootHasher::verify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackVerification {
    /// Freshly computed digest.
    pub computed: PackDigest,
    /// Root hash read from storage, if any.
    pub stored: Option<String>,
    /// Comparison outcome.
    pub status: PackVerificationStatus,
}

// ============================================================================
// SECTION: Exclusions
// ============================================================================

/// Immutable exclusion lists applied while indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackExclusions {
    /// Directory names skipped at any depth.
    dirs: BTreeSet<String>,
    /// File names skipped at any depth.
    files: BTreeSet<String>,
}

impl Default for PackExclusions {
    fn default() -> Self {
        Self {
            dirs: DEFAULT_EXCLUDED_DIRS.iter().map(ToString::to_string).collect(),
            files: DEFAULT_EXCLUDED_FILES.iter().map(ToString::to_string).collect(),
        }
    }
}

impl PackExclusions {
    /// Extends the default lists with extra names.
    #[must_use]
    pub fn with_extra<D, F>(dirs: D, files: F) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        let mut exclusions = Self::default();
        exclusions.dirs.extend(dirs.into_iter().map(Into::into));
        exclusions.files.extend(files.into_iter().map(Into::into));
        exclusions
    }

    /// Returns true when a directory name is excluded.
    #[must_use]
    pub fn excludes_dir(&self, name: &str) -> bool {
        self.dirs.contains(name)
    }

    /// Returns true when a file name is excluded.
    #[must_use]
    pub fn excludes_file(&self, name: &str) -> bool {
        self.files.contains(name)
    }
}

// ============================================================================
// SECTION: Indexer
// ============================================================================

/// Enumerates the hashable files of a pack.
#[derive(Debug, Clone, Default)]
pub struct PackIndexer {
    /// Exclusion lists.
    exclusions: PackExclusions,
}

impl PackIndexer {
    /// Creates an indexer with explicit exclusions.
    #[must_use]
    pub const fn new(exclusions: PackExclusions) -> Self {
        Self {
            exclusions,
        }
    }

    /// Lists relative file paths in filesystem order. Callers must sort.
    ///
    /// Symlinked files are listed under the link path and hashed through their
    /// target. Symlinked directories are never followed.
    ///
    /// # Errors
    ///
    /// Returns [`PackError`] when the root is missing, a directory cannot be
    /// listed, a symlink target cannot be resolved, or a path is not UTF-8.
    pub fn list(&self, root: &Path) -> Result<Vec<String>, PackError> {
        if !root.is_dir() {
            return Err(PackError::MissingRoot(root.to_path_buf()));
        }
        let mut paths = Vec::new();
        let mut pending: Vec<(PathBuf, String)> = vec![(root.to_path_buf(), String::new())];
        while let Some((dir, prefix)) = pending.pop() {
            let read_dir = fs::read_dir(&dir).map_err(|source| PackError::Walk {
                path: dir.clone(),
                source,
            })?;
            for entry in read_dir {
                let entry = entry.map_err(|source| PackError::Walk {
                    path: dir.clone(),
                    source,
                })?;
                let file_type = entry.file_type().map_err(|source| PackError::Walk {
                    path: entry.path(),
                    source,
                })?;
                let name = entry
                    .file_name()
                    .into_string()
                    .map_err(|_| PackError::NonUtf8Path(entry.path()))?;
                let relative =
                    if prefix.is_empty() { name.clone() } else { format!("{prefix}/{name}") };
                if file_type.is_dir() {
                    if !self.exclusions.excludes_dir(&name) {
                        pending.push((entry.path(), relative));
                    }
                } else if !self.exclusions.excludes_file(&name)
                    && resolves_to_file(file_type, &entry.path())?
                {
                    paths.push(relative);
                }
            }
        }
        Ok(paths)
    }
}

/// Returns true for regular files and for symlinks whose target is a file.
fn resolves_to_file(file_type: fs::FileType, path: &Path) -> Result<bool, PackError> {
    if !file_type.is_symlink() {
        return Ok(file_type.is_file());
    }
    let target = fs::metadata(path).map_err(|source| PackError::Walk {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(target.is_file())
}

// ============================================================================
// SECTION: Root Hasher
// ============================================================================

/// Computes, persists, and reads pack root hashes.
#[derive(Debug, Clone)]
pub struct PackRootHasher {
    /// File indexer.
    indexer: PackIndexer,
    /// Maximum concurrent file reads.
    max_parallel_reads: usize,
}

impl Default for PackRootHasher {
    fn default() -> Self {
        Self::new(PackIndexer::default(), DEFAULT_MAX_PARALLEL_READS)
    }
}

impl PackRootHasher {
    /// Creates a hasher with an explicit indexer and read concurrency.
    #[must_use]
    pub fn new(indexer: PackIndexer, max_parallel_reads: usize) -> Self {
        Self {
            indexer,
            max_parallel_reads: max_parallel_reads.max(1),
        }
    }

    /// Hashes every included file and folds the sorted entries into a root hash.
    ///
    /// # Errors
    ///
    /// Returns [`PackError`] when indexing or any file read fails.
    pub fn compute(&self, root: &Path) -> Result<PackDigest, PackError> {
        let mut paths = self.indexer.list(root)?;
        paths.sort_by(|a, b| a.as_bytes().cmp(b.as_bytes()));
        let entries = SumsDocument::new(self.hash_paths(root, &paths)?)?;
        let root_hash = entries.root_hash();
        Ok(PackDigest {
            entries,
            root_hash,
        })
    }

    /// Hashes files across scoped worker threads.
    fn hash_paths(&self, root: &Path, paths: &[String]) -> Result<Vec<FileEntry>, PackError> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }
        let chunk_size = paths.len().div_ceil(self.max_parallel_reads);
        thread::scope(|scope| -> Result<Vec<FileEntry>, PackError> {
            let workers: Vec<_> = paths
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|path| -> Result<FileEntry, PackError> {
                                let hash = hash_file(&root.join(path))?;
                                Ok(FileEntry {
                                    path: path.clone(),
                                    hash,
                                })
                            })
                            .collect::<Result<Vec<_>, _>>()
                    })
                })
                .collect();
            let mut entries = Vec::with_capacity(paths.len());
            for worker in workers {
                entries.extend(worker.join().map_err(|_| PackError::Worker)??);
            }
            Ok(entries)
        })
    }

    /// Persists the sums document and root hash as an atomic replace.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Write`] when staging or renaming fails.
    pub fn write(&self, root: &Path, digest: &PackDigest) -> Result<(), PackError> {
        if !root.is_dir() {
            return Err(PackError::MissingRoot(root.to_path_buf()));
        }
        let integrity = root.join(INTEGRITY_DIR);
        fs::create_dir_all(&integrity).map_err(|source| PackError::Write {
            path: integrity.clone(),
            source,
        })?;
        let sums_path = integrity.join(SUMS_FILE);
        let root_path = integrity.join(ROOT_HASH_FILE);
        let sums_tmp = integrity.join(format!(".{SUMS_FILE}.tmp"));
        let root_tmp = integrity.join(format!(".{ROOT_HASH_FILE}.tmp"));

        stage_file(&sums_tmp, digest.entries.render().as_bytes())?;
        stage_file(&root_tmp, format!("{}{SUMS_SEPARATOR}pack\n", digest.root_hash).as_bytes())?;
        commit_file(&sums_tmp, &sums_path)?;
        commit_file(&root_tmp, &root_path)
    }

    /// Reads the stored root hash, if present.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Read`] on I/O failure or [`PackError::Malformed`]
    /// when the file does not begin with a 64-hex digest.
    pub fn read(&self, root: &Path) -> Result<Option<String>, PackError> {
        let path = root.join(INTEGRITY_DIR).join(ROOT_HASH_FILE);
        let Some(text) = read_optional(&path)? else {
            return Ok(None);
        };
        let candidate = text.get(..64).unwrap_or_default();
        if is_sha256_hex(candidate) {
            Ok(Some(candidate.to_string()))
        } else {
            Err(PackError::Malformed {
                path,
                reason: "expected a 64-character lowercase hex digest".to_string(),
            })
        }
    }

    /// Reads the stored sums document, if present.
    ///
    /// # Errors
    ///
    /// Returns [`PackError`] on I/O failure or malformed content.
    pub fn read_sums(&self, root: &Path) -> Result<Option<SumsDocument>, PackError> {
        let path = root.join(INTEGRITY_DIR).join(SUMS_FILE);
        read_optional(&path)?.map(|text| SumsDocument::parse(&text, &path)).transpose()
    }

    /// Recomputes the root hash and compares it with the stored value.
    ///
    /// # Errors
    ///
    /// Returns [`PackError`] when recomputation or reading fails.
    pub fn verify(&self, root: &Path) -> Result<PackVerification, PackError> {
        let computed = self.compute(root)?;
        let stored = self.read(root)?;
        let status = match &stored {
            None => PackVerificationStatus::NoStoredHash,
            Some(hash) if *hash == computed.root_hash => PackVerificationStatus::Match,
            Some(_) => PackVerificationStatus::Mismatch,
        };
        Ok(PackVerification {
            computed,
            stored,
            status,
        })
    }
}

// ============================================================================
// SECTION: File Helpers
// ============================================================================

/// Writes a staging file and flushes it to disk.
fn stage_file(path: &Path, bytes: &[u8]) -> Result<(), PackError> {
    fs::write(path, bytes).map_err(|source| PackError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Renames a staged file over its final destination.
fn commit_file(staged: &Path, target: &Path) -> Result<(), PackError> {
    fs::rename(staged, target).map_err(|source| PackError::Write {
        path: target.to_path_buf(),
        source,
    })
}

/// Reads a UTF-8 file, returning `None` when it does not exist.
fn read_optional(path: &Path) -> Result<Option<String>, PackError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(PackError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}
