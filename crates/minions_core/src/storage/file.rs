//! Sharded file-system storage backend.
//!
//! # Responsibility
//! - Persist one minion per record under a two-level shard prefix.
//! - Serve reads from an in-memory index built once at open.
//! - Store raw attachments next to the record in directory layout.
//!
//! # Invariants
//! - Shard of an id is `root/<hex[0..2]>/<hex[2..4]>` of its hyphen-free
//!   hex form.
//! - Flat records live at `shard/<id>.<ext>`; directory records at
//!   `shard/<id>/minion.<ext>` next to their attachments.
//! - Every file write goes to `<target>.tmp` first, then is renamed.
//! - The index changes only after the new primary file is in place. A
//!   stale primary that cannot be removed is logged and left for the
//!   layout precedence rule at the next open.
//! - A record stored as a directory stays a directory.

use super::format::{JsonFormat, RecordFormat, YamlFormat};
use super::{
    apply_filter, search_minions, validate_attachment_name, AttachmentStorage, StorageAdapter,
    StorageError, StorageFilter, StorageResult, TMP_SUFFIX,
};
use crate::model::minion::{Minion, MinionId};
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

const PRIMARY_FILE_STEM: &str = "minion";

/// Adapter storing records as pretty-printed JSON.
pub type JsonFileStorageAdapter = FileStorageAdapter<JsonFormat>;
/// Adapter storing records as block YAML.
pub type YamlFileStorageAdapter = FileStorageAdapter<YamlFormat>;

/// Layout used when writing a record that is not yet on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileLayout {
    /// `shard/<id>.<ext>`.
    #[default]
    Flat,
    /// `shard/<id>/minion.<ext>` plus attachments.
    Directory,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileStorageOptions {
    pub layout: FileLayout,
}

#[derive(Debug, Clone)]
struct IndexEntry {
    minion: Minion,
    layout: FileLayout,
    /// Primary file currently holding the record.
    path: PathBuf,
}

/// File-backed adapter generic over the record encoding.
#[derive(Debug)]
pub struct FileStorageAdapter<F: RecordFormat> {
    root: PathBuf,
    options: FileStorageOptions,
    index: BTreeMap<MinionId, IndexEntry>,
    format: PhantomData<fn() -> F>,
}

/// Shard directory for `id` under `root`.
pub fn shard_dir(root: &Path, id: MinionId) -> PathBuf {
    let hex = id.simple().to_string();
    root.join(&hex[0..2]).join(&hex[2..4])
}

impl<F: RecordFormat> FileStorageAdapter<F> {
    /// Opens (creating if needed) a store at `root` with default options.
    pub fn open(root: impl AsRef<Path>) -> StorageResult<Self> {
        Self::open_with(root, FileStorageOptions::default())
    }

    /// Opens a store at `root` and loads every readable record.
    ///
    /// # Errors
    /// - `Io` when the root cannot be created or a directory cannot be read
    ///   for reasons other than disappearing mid-scan.
    pub fn open_with(root: impl AsRef<Path>, options: FileStorageOptions) -> StorageResult<Self> {
        let started_at = Instant::now();
        info!(
            "event=storage_open module=storage status=start format={} layout={:?}",
            F::EXTENSION,
            options.layout
        );

        let root = root.as_ref().to_path_buf();
        let mut adapter = Self {
            root,
            options,
            index: BTreeMap::new(),
            format: PhantomData,
        };

        let result = fs::create_dir_all(&adapter.root)
            .map_err(|source| io_error(&adapter.root, source))
            .and_then(|()| adapter.build_index());
        match result {
            Ok(()) => {
                info!(
                    "event=storage_open module=storage status=ok format={} records={} duration_ms={}",
                    F::EXTENSION,
                    adapter.index.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(adapter)
            }
            Err(err) => {
                error!(
                    "event=storage_open module=storage status=error format={} duration_ms={} error={}",
                    F::EXTENSION,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> FileStorageOptions {
        self.options
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn flat_path(&self, id: MinionId, extension: &str) -> PathBuf {
        shard_dir(&self.root, id).join(format!("{id}.{extension}"))
    }

    fn record_dir(&self, id: MinionId) -> PathBuf {
        shard_dir(&self.root, id).join(id.to_string())
    }

    fn primary_path(&self, id: MinionId, extension: &str) -> PathBuf {
        self.record_dir(id)
            .join(format!("{PRIMARY_FILE_STEM}.{extension}"))
    }

    fn build_index(&mut self) -> StorageResult<()> {
        for level_one in read_subdirs(&self.root)? {
            for level_two in read_subdirs(&level_one)? {
                let Some(entries) = read_dir_sorted(&level_two)? else {
                    continue;
                };
                for entry in entries {
                    self.index_entry(&entry)?;
                }
            }
        }
        Ok(())
    }

    fn index_entry(&mut self, path: &Path) -> StorageResult<()> {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            return Ok(());
        };
        if name.ends_with(TMP_SUFFIX) {
            debug!("event=storage_index module=storage status=skip reason=tmp_file");
            return Ok(());
        }

        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                warn!("event=storage_index module=storage status=skip reason=vanished");
                return Ok(());
            }
            Err(source) => return Err(io_error(path, source)),
        };

        let (id_text, primary, layout) = if metadata.is_dir() {
            let Some(primary) = find_primary::<F>(path)? else {
                return Ok(());
            };
            (name, primary, FileLayout::Directory)
        } else {
            let Some((stem, ext)) = name.rsplit_once('.') else {
                return Ok(());
            };
            if !F::READ_EXTENSIONS.contains(&ext) {
                return Ok(());
            }
            (stem, path.to_path_buf(), FileLayout::Flat)
        };

        let Some(minion) = load_record::<F>(&primary)? else {
            return Ok(());
        };
        if Uuid::parse_str(id_text).ok() != Some(minion.id) {
            warn!("event=storage_index module=storage status=skip reason=id_path_mismatch");
            return Ok(());
        }

        if let Some(existing) = self.index.get(&minion.id) {
            if existing.layout == FileLayout::Directory || layout == FileLayout::Flat {
                warn!("event=storage_index module=storage status=skip reason=duplicate_record");
                return Ok(());
            }
        }
        self.index.insert(
            minion.id,
            IndexEntry {
                minion,
                layout,
                path: primary,
            },
        );
        Ok(())
    }

    /// Writes `minion` in `layout`, then drops any older primary file.
    fn write_record(&mut self, minion: Minion, layout: FileLayout) -> StorageResult<()> {
        let id = minion.id;
        let target = match layout {
            FileLayout::Flat => self.flat_path(id, F::EXTENSION),
            FileLayout::Directory => self.primary_path(id, F::EXTENSION),
        };
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
        }

        let encoded = F::encode(&minion)?;
        write_atomic(&target, encoded.as_bytes())?;

        let previous = self.index.insert(
            id,
            IndexEntry {
                minion,
                layout,
                path: target.clone(),
            },
        );
        debug!(
            "event=storage_write module=storage status=ok layout={:?}",
            layout
        );

        if let Some(previous) = previous.filter(|entry| entry.path != target) {
            if let Err(err) = remove_file_if_exists(&previous.path) {
                warn!(
                    "event=storage_cleanup module=storage status=error layout={:?} error={}",
                    previous.layout, err
                );
            }
        }
        Ok(())
    }
}

impl<F: RecordFormat> StorageAdapter for FileStorageAdapter<F> {
    fn get(&self, id: MinionId) -> StorageResult<Option<Minion>> {
        Ok(self.index.get(&id).map(|entry| entry.minion.clone()))
    }

    fn set(&mut self, minion: Minion) -> StorageResult<()> {
        let stored_as_directory = self
            .index
            .get(&minion.id)
            .is_some_and(|entry| entry.layout == FileLayout::Directory);
        let layout = if stored_as_directory {
            FileLayout::Directory
        } else {
            self.options.layout
        };
        self.write_record(minion, layout)
    }

    fn delete(&mut self, id: MinionId) -> StorageResult<()> {
        for ext in F::READ_EXTENSIONS {
            remove_file_if_exists(&self.flat_path(id, ext))?;
        }
        let dir = self.record_dir(id);
        match fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(source) => return Err(io_error(&dir, source)),
        }

        if self.index.remove(&id).is_some() {
            debug!("event=storage_delete module=storage status=ok");
        }
        Ok(())
    }

    fn list(&self, filter: &StorageFilter) -> StorageResult<Vec<Minion>> {
        Ok(apply_filter(
            self.index.values().map(|entry| &entry.minion),
            filter,
        ))
    }

    fn search(&self, query: &str) -> StorageResult<Vec<Minion>> {
        Ok(search_minions(
            self.index.values().map(|entry| &entry.minion),
            query,
        ))
    }
}

impl<F: RecordFormat> AttachmentStorage for FileStorageAdapter<F> {
    fn put_file(&mut self, id: MinionId, name: &str, data: &[u8]) -> StorageResult<()> {
        validate_attachment_name(name)?;
        let entry = self.index.get(&id).ok_or(StorageError::NotFound(id))?;
        if entry.layout == FileLayout::Flat {
            let minion = entry.minion.clone();
            self.write_record(minion, FileLayout::Directory)?;
            debug!("event=storage_migrate module=storage status=ok from=flat to=directory");
        }

        write_atomic(&self.record_dir(id).join(name), data)?;
        debug!(
            "event=storage_put_file module=storage status=ok bytes={}",
            data.len()
        );
        Ok(())
    }

    fn get_file(&self, id: MinionId, name: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_attachment_name(name)?;
        let path = self.record_dir(id).join(name);
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(io_error(&path, source)),
        }
    }

    fn delete_file(&mut self, id: MinionId, name: &str) -> StorageResult<()> {
        validate_attachment_name(name)?;
        remove_file_if_exists(&self.record_dir(id).join(name))
    }

    fn list_files(&self, id: MinionId) -> StorageResult<Vec<String>> {
        let Some(entries) = read_dir_sorted(&self.record_dir(id))? else {
            return Ok(Vec::new());
        };
        Ok(entries
            .iter()
            .filter(|path| path.is_file())
            .filter_map(|path| path.file_name().and_then(|name| name.to_str()))
            .filter(|name| validate_attachment_name(name).is_ok())
            .map(str::to_string)
            .collect())
    }
}

/// Reads and decodes one record; `Ok(None)` when it should be skipped.
fn load_record<F: RecordFormat>(path: &Path) -> StorageResult<Option<Minion>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!("event=storage_index module=storage status=skip reason=vanished");
            return Ok(None);
        }
        Err(err) if err.kind() == ErrorKind::InvalidData => {
            warn!("event=storage_index module=storage status=skip reason=not_utf8");
            return Ok(None);
        }
        Err(source) => return Err(io_error(path, source)),
    };

    match F::decode(&text, path) {
        Ok(minion) => Ok(Some(minion)),
        Err(err) => {
            warn!("event=storage_index module=storage status=skip reason=decode_failed error={err}");
            Ok(None)
        }
    }
}

/// First primary file inside a record directory, in read-extension order.
fn find_primary<F: RecordFormat>(dir: &Path) -> StorageResult<Option<PathBuf>> {
    for ext in F::READ_EXTENSIONS {
        let candidate = dir.join(format!("{PRIMARY_FILE_STEM}.{ext}"));
        match fs::metadata(&candidate) {
            Ok(metadata) if metadata.is_file() => return Ok(Some(candidate)),
            Ok(_) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(source) => return Err(io_error(&candidate, source)),
        }
    }
    Ok(None)
}

/// Entries of `dir` sorted by path; `None` when the directory is gone.
fn read_dir_sorted(dir: &Path) -> StorageResult<Option<Vec<PathBuf>>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(io_error(dir, source)),
    };

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| io_error(dir, source))?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(Some(paths))
}

fn read_subdirs(dir: &Path) -> StorageResult<Vec<PathBuf>> {
    Ok(read_dir_sorted(dir)?
        .unwrap_or_default()
        .into_iter()
        .filter(|path| path.is_dir())
        .collect())
}

fn write_atomic(target: &Path, bytes: &[u8]) -> StorageResult<()> {
    let mut tmp = target.as_os_str().to_os_string();
    tmp.push(TMP_SUFFIX);
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes).map_err(|source| io_error(&tmp, source))?;
    if let Err(source) = fs::rename(&tmp, target) {
        let _ = fs::remove_file(&tmp);
        return Err(io_error(target, source));
    }
    Ok(())
}

fn remove_file_if_exists(path: &Path) -> StorageResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(io_error(path, source)),
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StorageError {
    StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::{find_primary, shard_dir, write_atomic, JsonFileStorageAdapter};
    use crate::storage::format::{JsonFormat, YamlFormat};
    use crate::storage::{StorageAdapter, StorageError};
    use std::fs;
    use std::path::Path;
    use uuid::Uuid;

    #[test]
    fn shard_dir_uses_first_two_hex_pairs() {
        let id = Uuid::parse_str("abcdef01-2345-4678-9abc-def012345678").unwrap();
        assert_eq!(
            shard_dir(Path::new("/data"), id),
            Path::new("/data").join("ab").join("cd")
        );
    }

    #[test]
    fn write_atomic_leaves_no_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("record.json");

        write_atomic(&target, b"{}").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"{}");
        assert!(!dir.path().join("record.json.tmp").exists());
    }

    #[test]
    fn find_primary_prefers_read_extension_order() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_primary::<YamlFormat>(dir.path()).unwrap().is_none());

        fs::write(dir.path().join("minion.yml"), b"{}").unwrap();
        fs::create_dir(dir.path().join("minion.yaml")).unwrap();
        assert_eq!(
            find_primary::<YamlFormat>(dir.path()).unwrap(),
            Some(dir.path().join("minion.yml"))
        );
    }

    #[test]
    fn find_primary_reports_unreadable_record_dir() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("record");
        fs::write(&not_a_dir, b"plain file").unwrap();

        match find_primary::<JsonFormat>(&not_a_dir) {
            Err(StorageError::Io { path, .. }) => {
                assert_eq!(path, not_a_dir.join("minion.json"));
            }
            other => panic!("expected io error, got {other:?}"),
        }
    }

    #[test]
    fn open_ignores_tmp_leftovers_and_malformed_records() {
        let dir = tempfile::tempdir().unwrap();
        let shard = dir.path().join("12").join("34");
        fs::create_dir_all(&shard).unwrap();
        let id = "12345678-0000-4000-8000-000000000000";
        fs::write(shard.join(format!("{id}.json.tmp")), b"{ partial").unwrap();
        fs::write(shard.join(format!("{id}.json")), b"not json").unwrap();
        fs::write(shard.join("notes.txt"), b"unrelated").unwrap();

        let storage = JsonFileStorageAdapter::open(dir.path()).unwrap();

        assert!(storage.is_empty());
        assert!(storage
            .get(Uuid::parse_str(id).unwrap())
            .unwrap()
            .is_none());
    }
}
