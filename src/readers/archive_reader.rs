use crate::error::{ProcessingError, Result};
use crate::readers::record_reader::RecordIterator;
use crate::utils::constants::DEFAULT_BUFFER_SIZE;
use flate2::read::MultiGzDecoder;
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::{Path, PathBuf};

pub type RecordStream = RecordIterator<Box<dyn BufRead + Send>>;

/// Opens yearly GHCN-Daily archives (`{year}.csv.gz` or `{year}.csv`) from a
/// local directory as record streams.
#[derive(Debug, Clone)]
pub struct YearArchiveReader {
    archive_dir: PathBuf,
    use_mmap: bool,
}

impl YearArchiveReader {
    pub fn new(archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            archive_dir: archive_dir.into(),
            use_mmap: false,
        }
    }

    /// Memory-map uncompressed archives instead of buffered reads
    pub fn with_mmap(mut self, use_mmap: bool) -> Self {
        self.use_mmap = use_mmap;
        self
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    /// Archive file for a year, preferring the compressed form
    pub fn archive_path(&self, year: i32) -> Option<PathBuf> {
        [format!("{}.csv.gz", year), format!("{}.csv", year)]
            .into_iter()
            .map(|name| self.archive_dir.join(name))
            .find(|path| path.is_file())
    }

    pub fn open(&self, year: i32) -> Result<RecordStream> {
        let path = self.archive_path(year).ok_or_else(|| {
            ProcessingError::MissingData(format!(
                "No archive for {} in {}",
                year,
                self.archive_dir.display()
            ))
        })?;

        let file = File::open(&path)?;
        let reader: Box<dyn BufRead + Send> = if path.extension().is_some_and(|ext| ext == "gz") {
            Box::new(BufReader::with_capacity(
                DEFAULT_BUFFER_SIZE,
                MultiGzDecoder::new(file),
            ))
        } else if self.use_mmap {
            // SAFETY: archives are read-only inputs that are not modified while mapped.
            let mmap = unsafe { Mmap::map(&file)? };
            Box::new(Cursor::new(mmap))
        } else {
            Box::new(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file))
        };

        Ok(RecordIterator::new(reader))
    }

    /// Years in `start..=end` that have no archive in the directory
    pub fn missing_years(&self, start: i32, end: i32) -> Vec<i32> {
        (start..=end)
            .filter(|year| self.archive_path(*year).is_none())
            .collect()
    }
}
