//! Optional large-file compression with streamed progress reporting.
//!
//! Dump files can reach multiple gigabytes, so the stage copies the source
//! in bounded chunks and reports cumulative bytes processed after each one.
//! The source file is never mutated or deleted; the output is a sibling
//! file named after the source plus the method's canonical extension.

use std::fs;
use std::fs::File;
use std::io;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use flate2::write::GzEncoder;

/// Read chunk size for the streaming copy.
const CHUNK_SIZE: usize = 64 * 1024;

/// Compression algorithm selected by the operator's `--compress` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMethod {
    Gzip,
    Zstd,
}

impl CompressionMethod {
    /// Parse an operator-supplied flag value.
    ///
    /// Unrecognized input yields `None`, which callers treat as "no
    /// compression requested" rather than an error. This asymmetry (a typo
    /// silently disables the feature) is an intentional, load-bearing
    /// contract of the flag surface.
    pub fn from_flag(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "gzip" | "gz" => Some(Self::Gzip),
            "zstd" | "zst" => Some(Self::Zstd),
            _ => None,
        }
    }

    /// Canonical file extension for this method.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Gzip => "gz",
            Self::Zstd => "zst",
        }
    }

    /// Output path: the source path with the method extension appended.
    pub fn sibling_path(self, source: &Path) -> PathBuf {
        let mut name = source.as_os_str().to_os_string();
        name.push(".");
        name.push(self.extension());
        PathBuf::from(name)
    }
}

/// A completed compression artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedFile {
    pub path: PathBuf,
    /// Size of the compressed file on disk, in bytes.
    pub size: u64,
}

/// Compress `source` into a sibling file, invoking `progress` with the
/// cumulative number of source bytes processed after each chunk.
///
/// On any failure the partial output is removed before the error is
/// returned, so a truncated file is never left looking like a finished
/// artifact. All file handles are released on every exit path.
pub fn compress(
    source: &Path,
    method: CompressionMethod,
    progress: &mut dyn FnMut(u64),
) -> io::Result<CompressedFile> {
    let target = method.sibling_path(source);
    match compress_into(source, &target, method, progress) {
        Ok(()) => {
            let size = fs::metadata(&target)?.len();
            Ok(CompressedFile { path: target, size })
        }
        Err(err) => {
            let _ = fs::remove_file(&target);
            Err(err)
        }
    }
}

fn compress_into(
    source: &Path,
    target: &Path,
    method: CompressionMethod,
    progress: &mut dyn FnMut(u64),
) -> io::Result<()> {
    let mut input = File::open(source)?;
    let output = File::create(target)?;

    match method {
        CompressionMethod::Gzip => {
            let mut encoder = GzEncoder::new(output, flate2::Compression::default());
            stream_copy(&mut input, &mut encoder, progress)?;
            encoder.finish()?;
        }
        CompressionMethod::Zstd => {
            let mut encoder = zstd::Encoder::new(output, 0)?;
            stream_copy(&mut input, &mut encoder, progress)?;
            encoder.finish()?;
        }
    }

    Ok(())
}

fn stream_copy(
    input: &mut File,
    output: &mut impl Write,
    progress: &mut dyn FnMut(u64),
) -> io::Result<()> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut processed: u64 = 0;
    loop {
        let read = input.read(&mut buf)?;
        if read == 0 {
            break;
        }
        output.write_all(&buf[..read])?;
        processed += read as u64;
        progress(processed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Read;
    use tempfile::TempDir;

    fn write_source(dir: &TempDir, len: usize) -> PathBuf {
        let path = dir.path().join("heap-2025-01-01_00.00.00.memsnap");
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        fs::write(&path, data).unwrap();
        path
    }

    #[test]
    fn unrecognized_flag_value_is_not_an_error() {
        assert_eq!(CompressionMethod::from_flag("gzip"), Some(CompressionMethod::Gzip));
        assert_eq!(CompressionMethod::from_flag("GZIP"), Some(CompressionMethod::Gzip));
        assert_eq!(CompressionMethod::from_flag("zst"), Some(CompressionMethod::Zstd));
        assert_eq!(CompressionMethod::from_flag("lzma"), None);
        assert_eq!(CompressionMethod::from_flag(""), None);
    }

    #[test]
    fn sibling_path_appends_extension() {
        let path = CompressionMethod::Gzip.sibling_path(Path::new("/tmp/heap.memsnap"));
        assert_eq!(path, PathBuf::from("/tmp/heap.memsnap.gz"));
    }

    #[test]
    fn gzip_leaves_source_intact_and_reports_cumulative_progress() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, 200 * 1024);
        let original = fs::read(&source).unwrap();

        let mut reports = Vec::new();
        let compressed = compress(&source, CompressionMethod::Gzip, &mut |p| reports.push(p))
            .unwrap();

        // Source untouched.
        assert_eq!(fs::read(&source).unwrap(), original);

        // Cumulative, monotonic, ends at the source length.
        assert!(reports.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*reports.last().unwrap(), original.len() as u64);

        // Reported size matches bytes on disk, and the content decodes back.
        assert_eq!(compressed.size, fs::metadata(&compressed.path).unwrap().len());
        let mut decoder = flate2::read::GzDecoder::new(File::open(&compressed.path).unwrap());
        let mut decoded = Vec::new();
        decoder.read_to_end(&mut decoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn zstd_output_decodes_back_to_source() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, 70 * 1024);
        let original = fs::read(&source).unwrap();

        let compressed = compress(&source, CompressionMethod::Zstd, &mut |_| {}).unwrap();

        assert_eq!(compressed.path.extension().unwrap(), "zst");
        let decoded = zstd::decode_all(File::open(&compressed.path).unwrap()).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(fs::read(&source).unwrap(), original);
    }

    #[test]
    fn missing_source_fails_without_creating_output() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("does-not-exist.memsnap");

        let err = compress(&source, CompressionMethod::Gzip, &mut |_| {}).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!CompressionMethod::Gzip.sibling_path(&source).exists());
    }

    #[test]
    fn failure_does_not_expose_a_partial_output() {
        let dir = TempDir::new().unwrap();
        let source = write_source(&dir, 1024);

        // Occupy the output path with a directory so the create fails after
        // the source was opened successfully.
        let target = CompressionMethod::Gzip.sibling_path(&source);
        fs::create_dir(&target).unwrap();

        let result = compress(&source, CompressionMethod::Gzip, &mut |_| {});
        assert!(result.is_err());
        assert_eq!(fs::read(&source).unwrap().len(), 1024);
        // No regular-file artifact appeared at the output path.
        assert!(target.is_dir());
    }
}
