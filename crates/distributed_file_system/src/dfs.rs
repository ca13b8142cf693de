//! File system rooted at a local directory.

use std::{
    fmt::Display,
    fs::{self, File},
    io::{self, BufRead, BufReader, BufWriter, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use atomicwrites::{AtomicFile, DisallowOverwrite};
use log::{debug, warn};
use thiserror::Error;

use crate::{
    path::DfsPath,
    split::{compute_splits, InputSplit, SplitRecords},
};

/// Name of the marker written into an output directory of a successful job.
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Errors of file system operations.
#[derive(Debug, Error)]
pub enum DfsError {
    #[error("input path does not exist: {0}")]
    NotFound(DfsPath),
    #[error("output directory {0} already exists")]
    AlreadyExists(DfsPath),
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> DfsError + '_ {
    move |source| DfsError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Name of the output file of reduce task `partition`.
pub fn part_file_name(partition: usize) -> String {
    format!("part-r-{:05}", partition)
}

/// Hidden files are never treated as job input.
fn is_hidden(name: &str) -> bool {
    name.starts_with('_') || name.starts_with('.')
}

/// File system whose absolute paths are resolved against a local root directory.
///
/// With root `/` a path like `/user/root/task2/input_wordcount_500MB` is used as is.
/// Relative paths are resolved against the working directory, which is the root unless set.
#[derive(Clone, Debug)]
pub struct LocalDfs {
    root: PathBuf,
    working_dir: PathBuf,
}

impl LocalDfs {
    /// Creates new [LocalDfs] rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        LocalDfs {
            working_dir: root.clone(),
            root,
        }
    }

    /// Sets the local directory against which relative paths are resolved.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Local path of a file system path.
    pub fn resolve(&self, path: &DfsPath) -> PathBuf {
        match path.as_str().strip_prefix('/') {
            Some(absolute) => self.root.join(absolute.trim_start_matches('/')),
            None => self.working_dir.join(path.as_str()),
        }
    }

    pub fn exists(&self, path: &DfsPath) -> bool {
        self.resolve(path).exists()
    }

    /// Removes a file or a directory recursively. Returns whether something was removed.
    pub fn remove(&self, path: &DfsPath) -> Result<bool, DfsError> {
        let local = self.resolve(path);
        let metadata = match fs::metadata(&local) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(io_error(&local)(e)),
        };
        if metadata.is_dir() {
            fs::remove_dir_all(&local).map_err(io_error(&local))?;
        } else {
            fs::remove_file(&local).map_err(io_error(&local))?;
        }
        Ok(true)
    }

    /// Lists input files of `path`: the file itself, or all visible files of a directory in name order.
    pub fn list_input_files(&self, path: &DfsPath) -> Result<Vec<PathBuf>, DfsError> {
        let local = self.resolve(path);
        let metadata = match fs::metadata(&local) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(DfsError::NotFound(path.clone())),
            Err(e) => return Err(io_error(&local)(e)),
        };
        if metadata.is_file() {
            return Ok(vec![local]);
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(&local).map_err(io_error(&local))? {
            let entry = entry.map_err(io_error(&local))?;
            let name = entry.file_name();
            if is_hidden(&name.to_string_lossy()) {
                continue;
            }
            let file_type = entry.file_type().map_err(io_error(&entry.path()))?;
            if file_type.is_dir() {
                warn!("skipping nested directory {} in input {}", entry.path().display(), path);
                continue;
            }
            files.push(entry.path());
        }
        files.sort();
        Ok(files)
    }

    /// Splits all input files of `paths` into splits of about `split_size` bytes.
    pub fn splits(&self, paths: &[DfsPath], split_size: u64) -> Result<Vec<InputSplit>, DfsError> {
        let mut splits = Vec::new();
        for path in paths.iter() {
            for file in self.list_input_files(path)? {
                let len = fs::metadata(&file).map_err(io_error(&file))?.len();
                let file_splits = compute_splits(file, len, split_size, splits.len());
                debug!(
                    "file {} of size {} is split into {} splits",
                    file_splits[0].file.display(),
                    len,
                    file_splits.len()
                );
                splits.extend(file_splits);
            }
        }
        Ok(splits)
    }

    /// Reads all lines belonging to a split.
    ///
    /// A split which does not start at the beginning of a file skips its first line, since the previous
    /// split reads every line starting at or before its own end, even past the split boundary.
    pub fn read_records(&self, split: &InputSplit) -> Result<SplitRecords, DfsError> {
        let file = File::open(&split.file).map_err(io_error(&split.file))?;
        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(split.start)).map_err(io_error(&split.file))?;

        let mut pos = split.start;
        if split.start != 0 {
            let mut skipped = Vec::new();
            pos += reader
                .read_until(b'\n', &mut skipped)
                .map_err(io_error(&split.file))? as u64;
        }

        let mut data = Vec::with_capacity(split.length as usize);
        while pos <= split.end() {
            let read = reader.read_until(b'\n', &mut data).map_err(io_error(&split.file))?;
            if read == 0 {
                break;
            }
            pos += read as u64;
        }
        Ok(SplitRecords::new(data))
    }

    /// Creates the output directory of a job. Fails if it already exists.
    pub fn create_output_dir(&self, path: &DfsPath) -> Result<PathBuf, DfsError> {
        let local = self.resolve(path);
        if local.exists() {
            return Err(DfsError::AlreadyExists(path.clone()));
        }
        fs::create_dir_all(&local).map_err(io_error(&local))?;
        Ok(local)
    }

    /// Atomically writes the output of reduce task `partition` as `key\tvalue` lines.
    /// Returns the number of written records.
    pub fn write_part<K, V, I>(&self, output: &DfsPath, partition: usize, records: I) -> Result<u64, DfsError>
    where
        K: AsRef<[u8]>,
        V: Display,
        I: IntoIterator<Item = (K, V)>,
    {
        let path = self.resolve(output).join(part_file_name(partition));
        let written = AtomicFile::new(&path, DisallowOverwrite)
            .write(|file| {
                let mut writer = BufWriter::new(file);
                let mut written = 0;
                for (key, value) in records {
                    writer.write_all(key.as_ref())?;
                    writer.write_all(b"\t")?;
                    writeln!(writer, "{}", value)?;
                    written += 1;
                }
                writer.flush()?;
                Ok::<u64, io::Error>(written)
            })
            .map_err(|e| match e {
                atomicwrites::Error::Internal(e) | atomicwrites::Error::User(e) => io_error(&path)(e),
            })?;
        debug!("written {} records to {}", written, path.display());
        Ok(written)
    }

    /// Marks the output directory of a job as complete.
    pub fn mark_success(&self, output: &DfsPath) -> Result<(), DfsError> {
        let path = self.resolve(output).join(SUCCESS_MARKER);
        File::create(&path).map_err(io_error(&path))?;
        Ok(())
    }

    /// Reads lines of all part files of an output directory, in part order.
    pub fn read_parts(&self, output: &DfsPath) -> Result<Vec<Vec<u8>>, DfsError> {
        let local = self.resolve(output);
        let mut parts = Vec::new();
        for entry in fs::read_dir(&local).map_err(io_error(&local))? {
            let entry = entry.map_err(io_error(&local))?;
            if entry.file_name().to_string_lossy().starts_with("part-") {
                parts.push(entry.path());
            }
        }
        parts.sort();

        let mut lines = Vec::new();
        for part in parts.iter() {
            let data = fs::read(part).map_err(io_error(part))?;
            lines.extend(SplitRecords::new(data).records().map(|line| line.to_vec()));
        }
        Ok(lines)
    }
}
