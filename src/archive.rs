use std::fs;
use std::io::{Cursor, Seek, Write};
use std::path::{Path, PathBuf};

use tracing::*;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::{Result, SliceArtifact, SliceError, DEFAULT_ARCHIVE_NAME, SLICES_FOLDER};

/// A finished ZIP archive and the file name it should be saved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Receives finished archives, e.g. by saving them to disk.
pub trait ArchiveSink {
    fn deliver(&mut self, archive: &Archive) -> Result<()>;
}

/// Collects archives in memory.
impl ArchiveSink for Vec<Archive> {
    fn deliver(&mut self, archive: &Archive) -> Result<()> {
        self.push(archive.clone());
        Ok(())
    }
}

/// Writes each archive into a directory, creating the directory if needed.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path the archive named `name` is written to.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        let file_name = Path::new(name)
            .file_name()
            .ok_or_else(|| SliceError::ArchiveWrite(format!("invalid archive name {name:?}")))?;
        Ok(self.dir.join(file_name))
    }
}

impl ArchiveSink for DirectorySink {
    fn deliver(&mut self, archive: &Archive) -> Result<()> {
        let path = self.path_for(&archive.name)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(&path, &archive.bytes)?;
        info!(
            "Wrote {} ({} bytes)",
            path.display(),
            archive.bytes.len()
        );
        Ok(())
    }
}

/// Suggested archive name for slices of the file `original`.
///
/// # Example
/// ```
/// use gridslice::archive_name;
///
/// assert_eq!(archive_name(Some("sheet.png")), "sliced_sheet.png.zip");
/// assert_eq!(archive_name(Some("assets/hero.jpg")), "sliced_hero.jpg.zip");
/// assert_eq!(archive_name(None), "sprites.zip");
/// assert_eq!(archive_name(Some("")), "sprites.zip");
/// ```
pub fn archive_name(original: Option<&str>) -> String {
    original
        .and_then(|name| Path::new(name).file_name())
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .map(|name| format!("sliced_{name}.zip"))
        .unwrap_or_else(|| DEFAULT_ARCHIVE_NAME.to_string())
}

/// Packs `artifacts` into an in-memory ZIP archive named `name`.
///
/// Every artifact becomes the entry `slices/{file_name}`. An empty slice list
/// produces a valid archive without entries.
///
/// # Errors
/// Returns [`SliceError::ArchiveWrite`] if the archive cannot be written.
pub fn archive(artifacts: &[SliceArtifact], name: &str) -> Result<Archive> {
    let bytes = write_archive(artifacts, Cursor::new(Vec::new()))?.into_inner();
    debug!(
        "Packed {} slices into {} ({} bytes)",
        artifacts.len(),
        name,
        bytes.len()
    );
    Ok(Archive {
        name: name.to_string(),
        bytes,
    })
}

/// Streams the archive of `artifacts` into `writer` and returns the writer.
pub fn write_archive<W: Write + Seek>(artifacts: &[SliceArtifact], writer: W) -> Result<W> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for artifact in artifacts {
        let entry = format!("{}/{}", SLICES_FOLDER, artifact.file_name);
        trace!("Adding {} ({} bytes)", entry, artifact.bytes.len());
        zip.start_file(entry, options).map_err(archive_error)?;
        zip.write_all(&artifact.bytes)
            .map_err(|e| archive_error(ZipError::Io(e)))?;
    }

    zip.finish().map_err(archive_error)
}

/// Archives `artifacts` and hands the result to `sink`.
pub fn export<S: ArchiveSink + ?Sized>(
    artifacts: &[SliceArtifact],
    name: &str,
    sink: &mut S,
) -> Result<()> {
    let archive = archive(artifacts, name)?;
    sink.deliver(&archive)
}

fn archive_error(e: ZipError) -> SliceError {
    error!("Archive write failed: {}", e);
    SliceError::ArchiveWrite(e.to_string())
}
