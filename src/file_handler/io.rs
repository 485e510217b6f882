//! File I/O collaborator
//!
//! Reading decodes the common Unicode encodings of Markdown files; writing
//! is atomic (temp file plus rename) so a failed save never leaves a
//! truncated document behind.

use crate::error::{FileError, FileResult};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Detected encoding of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileEncoding {
    #[default]
    Utf8,
    Utf8Bom,
    Utf16Le,
    Utf16Be,
    /// Invalid UTF-8 without a BOM; decoded lossily
    Unknown,
}

/// Modification time and size, the pair used to detect external edits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub modified: Option<SystemTime>,
    pub size: u64,
}

impl FileStat {
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        Self {
            modified: metadata.modified().ok(),
            size: metadata.len(),
        }
    }
}

/// Result of reading a file
#[derive(Debug, Clone)]
pub struct FileReadResult {
    pub content: String,
    pub encoding: FileEncoding,
    pub stat: FileStat,
    /// Whether replacement characters were substituted
    pub lossy: bool,
}

fn detect_encoding(bytes: &[u8]) -> FileEncoding {
    match bytes {
        [0xEF, 0xBB, 0xBF, ..] => FileEncoding::Utf8Bom,
        [0xFF, 0xFE, ..] => FileEncoding::Utf16Le,
        [0xFE, 0xFF, ..] => FileEncoding::Utf16Be,
        _ if std::str::from_utf8(bytes).is_ok() => FileEncoding::Utf8,
        _ => FileEncoding::Unknown,
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> (String, bool) {
    let mut lossy = false;
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    let text = char::decode_utf16(units)
        .map(|r| {
            r.unwrap_or_else(|_| {
                lossy = true;
                char::REPLACEMENT_CHARACTER
            })
        })
        .collect();
    (text, lossy)
}

fn decode_utf8(bytes: &[u8]) -> (String, bool) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), false),
        Err(_) => (String::from_utf8_lossy(bytes).into_owned(), true),
    }
}

fn decode(bytes: &[u8], encoding: FileEncoding) -> (String, bool) {
    match encoding {
        FileEncoding::Utf8 | FileEncoding::Unknown => decode_utf8(bytes),
        FileEncoding::Utf8Bom => decode_utf8(&bytes[3..]),
        FileEncoding::Utf16Le => decode_utf16(&bytes[2..], u16::from_le_bytes),
        FileEncoding::Utf16Be => decode_utf16(&bytes[2..], u16::from_be_bytes),
    }
}

/// Current modification time and size of `path`
pub async fn stat_file(path: impl AsRef<Path>) -> FileResult<FileStat> {
    let path = path.as_ref();
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FileError::NotFound(path.to_path_buf()),
            _ => FileError::StatError {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
    if !metadata.is_file() {
        return Err(FileError::NotAFile {
            path: path.to_path_buf(),
        });
    }
    Ok(FileStat::from_metadata(&metadata))
}

/// Read a Markdown file, refusing files larger than `max_size`
pub async fn read_file(path: impl AsRef<Path>, max_size: u64) -> FileResult<FileReadResult> {
    let path = path.as_ref();
    let stat = stat_file(path).await?;
    if stat.size > max_size {
        return Err(FileError::FileTooLarge {
            path: path.to_path_buf(),
            size: stat.size,
            max_size,
        });
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| FileError::from_read(path, e))?;

    let encoding = detect_encoding(&bytes);
    let (content, lossy) = decode(&bytes, encoding);
    if lossy {
        log::warn!("{} is not valid {:?}; decoded lossily", path.display(), encoding);
    }

    Ok(FileReadResult {
        content,
        encoding,
        stat,
        lossy,
    })
}

fn temp_path_for(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("."));
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    parent.join(format!(".{}.{}.tmp", filename, uuid::Uuid::new_v4().simple()))
}

/// Write `content` atomically; returns the stat of the written file
pub async fn write_file_atomic(path: impl AsRef<Path>, content: &str) -> FileResult<FileStat> {
    let path = path.as_ref();
    let temp_path = temp_path_for(path);

    let result = async {
        let mut file = tokio::fs::File::create(&temp_path).await?;
        tokio::io::AsyncWriteExt::write_all(&mut file, content.as_bytes()).await?;
        tokio::io::AsyncWriteExt::flush(&mut file).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&temp_path, path).await
    }
    .await;

    if let Err(e) = result {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(FileError::WriteError {
            path: path.to_path_buf(),
            source: e,
        });
    }

    stat_file(path).await
}
