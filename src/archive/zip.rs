use flate2::bufread::DeflateDecoder;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Component, Path, PathBuf};
use tokio_util::io::SyncIoBridge;
use tracing::debug;

use crate::error::ExtractionError;
use crate::s3::ObjectBody;

/// Record signatures (little endian on the wire)
const LOCAL_HEADER_SIGNATURE: u32 = 0x04034b50;
const CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x02014b50;
const END_OF_CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x06054b50;
const ZIP64_END_OF_CENTRAL_DIRECTORY_SIGNATURE: u32 = 0x06064b50;
const DIGITAL_SIGNATURE: u32 = 0x05054b50;
const DATA_DESCRIPTOR_SIGNATURE: u32 = 0x08074b50;

/// Local File Header size after the 4-byte signature
const LOCAL_HEADER_REST_SIZE: usize = 26;

/// ZIP compression methods
const COMPRESSION_STORED: u16 = 0;
const COMPRESSION_DEFLATE: u16 = 8;

/// General purpose bit flags
const FLAG_ENCRYPTED: u16 = 0x0001;
const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;
const FLAG_UTF8: u16 = 0x0800;

/// Entry bytes are copied to disk in chunks of this size
pub const COPY_CHUNK_SIZE: usize = 64 * 1024;

/// An entry as described by its local file header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    /// Name exactly as stored in the archive
    pub name: String,
    pub compression_method: u16,
    /// Zero when the sizes follow the data in a data descriptor
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    flags: u16,
}

impl LocalEntry {
    /// Directory entries are named with a trailing separator
    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }

    fn has_data_descriptor(&self) -> bool {
        self.flags & FLAG_DATA_DESCRIPTOR != 0
    }
}

/// Forward-only reader over the local file headers of a zip stream.
///
/// Never seeks and never reads the central directory: entries come back in
/// the order they are stored, and the cursor stops at the first central
/// directory record or at a clean end of stream.
pub struct ZipCursor<R: Read> {
    reader: BufReader<R>,
    finished: bool,
}

impl<R: Read> ZipCursor<R> {
    pub fn new(reader: R) -> Self {
        ZipCursor {
            reader: BufReader::with_capacity(COPY_CHUNK_SIZE, reader),
            finished: false,
        }
    }

    /// Read the next local file header.
    ///
    /// The body of the previous entry must have been consumed with
    /// [`copy_entry`](Self::copy_entry) first.
    pub fn next_entry(&mut self) -> Result<Option<LocalEntry>, ExtractionError> {
        if self.finished {
            return Ok(None);
        }

        let Some(signature) = self.read_signature()? else {
            self.finished = true;
            return Ok(None);
        };

        match signature {
            LOCAL_HEADER_SIGNATURE => {}
            CENTRAL_DIRECTORY_SIGNATURE
            | END_OF_CENTRAL_DIRECTORY_SIGNATURE
            | ZIP64_END_OF_CENTRAL_DIRECTORY_SIGNATURE
            | DIGITAL_SIGNATURE => {
                self.finished = true;
                return Ok(None);
            }
            other => return Err(ExtractionError::InvalidSignature { signature: other }),
        }

        // Local File Header after the signature:
        // - 2 bytes: version needed to extract
        // - 2 bytes: general purpose bit flag
        // - 2 bytes: compression method
        // - 2 bytes: last mod file time
        // - 2 bytes: last mod file date
        // - 4 bytes: crc-32
        // - 4 bytes: compressed size
        // - 4 bytes: uncompressed size
        // - 2 bytes: file name length
        // - 2 bytes: extra field length
        let mut header = [0u8; LOCAL_HEADER_REST_SIZE];
        self.read_exact(&mut header, "local file header")?;

        let flags = u16::from_le_bytes([header[2], header[3]]);
        let compression_method = u16::from_le_bytes([header[4], header[5]]);
        let compressed_size_raw =
            u32::from_le_bytes([header[14], header[15], header[16], header[17]]);
        let uncompressed_size_raw =
            u32::from_le_bytes([header[18], header[19], header[20], header[21]]);
        let filename_len = u16::from_le_bytes([header[22], header[23]]) as usize;
        let extra_len = u16::from_le_bytes([header[24], header[25]]) as u64;

        let mut filename_bytes = vec![0u8; filename_len];
        self.read_exact(&mut filename_bytes, "entry name")?;
        self.skip(extra_len, "extra field")?;

        let name = decode_filename(&filename_bytes, flags);

        if flags & FLAG_ENCRYPTED != 0 {
            return Err(ExtractionError::Unsupported {
                name,
                reason: "encrypted entries are not supported".to_string(),
            });
        }

        // ZIP64 uses 0xFFFFFFFF as a placeholder
        if compressed_size_raw == u32::MAX || uncompressed_size_raw == u32::MAX {
            return Err(ExtractionError::Unsupported {
                name,
                reason: "ZIP64 entries are not supported".to_string(),
            });
        }

        Ok(Some(LocalEntry {
            name,
            compression_method,
            compressed_size: compressed_size_raw as u64,
            uncompressed_size: uncompressed_size_raw as u64,
            flags,
        }))
    }

    /// Decompress the current entry's data into `out`, returning the number
    /// of bytes written. `dest` only labels write errors.
    pub fn copy_entry<W: Write>(
        &mut self,
        entry: &LocalEntry,
        out: &mut W,
        dest: &Path,
    ) -> Result<u64, ExtractionError> {
        let written = match (entry.compression_method, entry.has_data_descriptor()) {
            (COMPRESSION_STORED, false) => {
                let mut body = (&mut self.reader).take(entry.compressed_size);
                let written = copy_chunked(&mut body, out).map_err(|e| e.stored(dest))?;
                if written < entry.compressed_size {
                    return Err(ExtractionError::Truncated("stored entry data"));
                }
                written
            }
            // Streaming writers still flag empty directory records
            (COMPRESSION_STORED, true) if entry.is_dir() => 0,
            (COMPRESSION_STORED, true) => {
                return Err(ExtractionError::Unsupported {
                    name: entry.name.clone(),
                    reason: "stored entries with a data descriptor have no known length"
                        .to_string(),
                });
            }
            (COMPRESSION_DEFLATE, false) => {
                let body = (&mut self.reader).take(entry.compressed_size);
                let mut decoder = DeflateDecoder::new(body);
                let written = copy_chunked(&mut decoder, out)
                    .map_err(|e| e.deflated(&entry.name, dest))?;

                // Skip whatever the inflater left of the declared size
                let mut rest = decoder.into_inner();
                io::copy(&mut rest, &mut io::sink()).map_err(ExtractionError::Read)?;
                if rest.limit() > 0 {
                    return Err(ExtractionError::Truncated("deflated entry data"));
                }
                written
            }
            (COMPRESSION_DEFLATE, true) => {
                // The deflate stream marks its own end; the inflater stops there
                let mut decoder = DeflateDecoder::new(&mut self.reader);
                copy_chunked(&mut decoder, out).map_err(|e| e.deflated(&entry.name, dest))?
            }
            (other, _) => {
                return Err(ExtractionError::Unsupported {
                    name: entry.name.clone(),
                    reason: format!(
                        "compression method {other}; only stored (0) and deflate (8) are supported"
                    ),
                });
            }
        };

        if entry.has_data_descriptor() {
            self.skip_data_descriptor()?;
        }

        Ok(written)
    }

    /// Data descriptor: optional signature, crc-32, compressed and uncompressed sizes
    fn skip_data_descriptor(&mut self) -> Result<(), ExtractionError> {
        let mut first = [0u8; 4];
        self.read_exact(&mut first, "data descriptor")?;
        let remaining = if u32::from_le_bytes(first) == DATA_DESCRIPTOR_SIGNATURE {
            12
        } else {
            8
        };
        self.skip(remaining, "data descriptor")
    }

    /// Read a record signature; `None` on a clean end of stream
    fn read_signature(&mut self) -> Result<Option<u32>, ExtractionError> {
        let mut buf = [0u8; 4];
        let mut filled = 0;

        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ExtractionError::Read(e)),
            }
        }

        match filled {
            0 => Ok(None),
            4 => Ok(Some(u32::from_le_bytes(buf))),
            _ => Err(ExtractionError::Truncated("record signature")),
        }
    }

    fn read_exact(&mut self, buf: &mut [u8], what: &'static str) -> Result<(), ExtractionError> {
        self.reader.read_exact(buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                ExtractionError::Truncated(what)
            } else {
                ExtractionError::Read(e)
            }
        })
    }

    fn skip(&mut self, len: u64, what: &'static str) -> Result<(), ExtractionError> {
        let skipped = io::copy(&mut (&mut self.reader).take(len), &mut io::sink())
            .map_err(ExtractionError::Read)?;
        if skipped < len {
            return Err(ExtractionError::Truncated(what));
        }
        Ok(())
    }
}

/// Which side of a copy failed
#[derive(Debug)]
enum CopyError {
    Read(io::Error),
    Write(io::Error),
}

impl CopyError {
    fn stored(self, dest: &Path) -> ExtractionError {
        match self {
            CopyError::Read(e) => ExtractionError::Read(e),
            CopyError::Write(source) => ExtractionError::Write {
                path: dest.to_path_buf(),
                source,
            },
        }
    }

    fn deflated(self, name: &str, dest: &Path) -> ExtractionError {
        match self {
            CopyError::Read(source) => ExtractionError::Decompress {
                name: name.to_string(),
                source,
            },
            CopyError::Write(source) => ExtractionError::Write {
                path: dest.to_path_buf(),
                source,
            },
        }
    }
}

/// Copy until the reader is exhausted, one fixed-size chunk at a time
fn copy_chunked<R: Read + ?Sized, W: Write + ?Sized>(
    reader: &mut R,
    writer: &mut W,
) -> Result<u64, CopyError> {
    let mut buf = vec![0u8; COPY_CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(CopyError::Read(e)),
        };
        writer.write_all(&buf[..n]).map_err(CopyError::Write)?;
        total += n as u64;
    }
}

/// Names flagged as UTF-8 decode as such; legacy names keep their byte
/// values as chars (CP437 and similar single-byte encodings)
fn decode_filename(bytes: &[u8], flags: u16) -> String {
    if flags & FLAG_UTF8 != 0 {
        String::from_utf8_lossy(bytes).to_string()
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

/// Local path for an entry; names that could leave the staging area are refused
fn entry_target(staging: &Path, name: &str) -> Result<PathBuf, ExtractionError> {
    if name.is_empty() {
        return Err(ExtractionError::Unsupported {
            name: String::new(),
            reason: "empty entry name".to_string(),
        });
    }

    let relative = Path::new(name);
    let contained = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !contained {
        return Err(ExtractionError::UnsafePath {
            name: name.to_string(),
        });
    }

    Ok(staging.join(relative))
}

fn write_error(path: &Path) -> impl FnOnce(io::Error) -> ExtractionError + '_ {
    move |source| ExtractionError::Write {
        path: path.to_path_buf(),
        source,
    }
}

/// Expands zip streams into a staging directory
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipExtractor;

impl ZipExtractor {
    pub fn new() -> Self {
        ZipExtractor
    }

    /// Expand every entry of `reader` under `staging`, in archive order.
    ///
    /// Returns the number of files written; directory entries only create
    /// directories and are not counted. The cursor and the underlying reader
    /// are dropped on every return path.
    pub fn extract<R: Read>(&self, reader: R, staging: &Path) -> Result<usize, ExtractionError> {
        let mut cursor = ZipCursor::new(reader);
        let mut files = 0;

        while let Some(entry) = cursor.next_entry()? {
            let target = entry_target(staging, &entry.name)?;

            if entry.is_dir() {
                fs::create_dir_all(&target).map_err(write_error(&target))?;
                cursor.copy_entry(&entry, &mut io::sink(), &target)?;
                debug!(entry = %entry.name, "created directory");
                continue;
            }

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(write_error(parent))?;
            }

            let mut file = File::create(&target).map_err(write_error(&target))?;
            let bytes = cursor.copy_entry(&entry, &mut file, &target)?;
            file.flush().map_err(write_error(&target))?;

            debug!(entry = %entry.name, bytes, "extracted entry");
            files += 1;
        }

        Ok(files)
    }

    /// Expand a downloaded object body.
    ///
    /// The zip reader is synchronous, so it runs on the blocking pool and
    /// pulls from the async body through a bridge.
    pub async fn extract_body(
        &self,
        body: ObjectBody,
        staging: &Path,
    ) -> Result<usize, ExtractionError> {
        let extractor = *self;
        let reader = SyncIoBridge::new(body);
        let staging = staging.to_path_buf();

        tokio::task::spawn_blocking(move || extractor.extract(reader, &staging))
            .await
            .map_err(|e| ExtractionError::Aborted(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::DeflateEncoder;
    use std::io::Cursor;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    /// Build a zip with the `zip` crate; `None` content means a directory entry
    fn build_zip(entries: &[(&str, Option<&[u8]>)], method: CompressionMethod) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = || SimpleFileOptions::default().compression_method(method);

        for (name, content) in entries {
            match content {
                Some(data) => {
                    writer.start_file(*name, options()).unwrap();
                    writer.write_all(data).unwrap();
                }
                None => writer.add_directory(*name, options()).unwrap(),
            }
        }

        writer.finish().unwrap().into_inner()
    }

    fn local_header(name: &str, flags: u16, method: u16, csize: u32, usize_: u32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&LOCAL_HEADER_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&20u16.to_le_bytes());
        out.extend_from_slice(&flags.to_le_bytes());
        out.extend_from_slice(&method.to_le_bytes());
        out.extend_from_slice(&[0u8; 4]);
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&csize.to_le_bytes());
        out.extend_from_slice(&usize_.to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(name.as_bytes());
        out
    }

    /// Stored entry with sizes in the header
    fn stored_entry(name: &str, data: &[u8]) -> Vec<u8> {
        let mut out = local_header(
            name,
            0,
            COMPRESSION_STORED,
            data.len() as u32,
            data.len() as u32,
        );
        out.extend_from_slice(data);
        out
    }

    /// Deflated entry whose sizes follow the data, as streaming writers emit them
    fn streamed_entry(name: &str, data: &[u8], descriptor_signature: bool) -> Vec<u8> {
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut out = local_header(name, FLAG_DATA_DESCRIPTOR, COMPRESSION_DEFLATE, 0, 0);
        out.extend_from_slice(&compressed);
        if descriptor_signature {
            out.extend_from_slice(&DATA_DESCRIPTOR_SIGNATURE.to_le_bytes());
        }
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out
    }

    fn staged_files(root: &Path) -> Vec<String> {
        let mut files: Vec<String> = walkdir::WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                e.path()
                    .strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_extracts_every_file_entry() {
        let staging = tempfile::tempdir().unwrap();
        let archive = build_zip(
            &[
                ("report.csv", Some(b"a,b\n1,2\n")),
                ("x/y/nested.txt", Some(b"nested content")),
                ("empty.txt", Some(b"")),
            ],
            CompressionMethod::Deflated,
        );

        let count = ZipExtractor::new()
            .extract(Cursor::new(archive), staging.path())
            .unwrap();

        assert_eq!(count, 3);
        assert_eq!(
            staged_files(staging.path()),
            vec!["empty.txt", "report.csv", "x/y/nested.txt"]
        );
        assert_eq!(
            fs::read(staging.path().join("x/y/nested.txt")).unwrap(),
            b"nested content"
        );
        assert_eq!(
            fs::read(staging.path().join("report.csv")).unwrap(),
            b"a,b\n1,2\n"
        );
        let empty = fs::read(staging.path().join("empty.txt")).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_extracts_stored_entries() {
        let staging = tempfile::tempdir().unwrap();
        let data = vec![7u8; COPY_CHUNK_SIZE * 2 + 17];
        let archive = build_zip(
            &[("big.bin", Some(&data)), ("small.txt", Some(b"tiny"))],
            CompressionMethod::Stored,
        );

        let count = ZipExtractor::new()
            .extract(Cursor::new(archive), staging.path())
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(fs::read(staging.path().join("big.bin")).unwrap(), data);
        assert_eq!(fs::read(staging.path().join("small.txt")).unwrap(), b"tiny");
    }

    #[test]
    fn test_directory_only_archive_writes_no_files() {
        let staging = tempfile::tempdir().unwrap();
        let archive = build_zip(
            &[("docs/", None), ("docs/inner/", None)],
            CompressionMethod::Deflated,
        );

        let count = ZipExtractor::new()
            .extract(Cursor::new(archive), staging.path())
            .unwrap();

        assert_eq!(count, 0);
        assert!(staged_files(staging.path()).is_empty());
        assert!(staging.path().join("docs/inner").is_dir());
    }

    #[test]
    fn test_empty_archive_is_not_an_error() {
        let staging = tempfile::tempdir().unwrap();
        let archive = build_zip(&[], CompressionMethod::Deflated);

        let count = ZipExtractor::new()
            .extract(Cursor::new(archive), staging.path())
            .unwrap();
        assert_eq!(count, 0);

        let count = ZipExtractor::new()
            .extract(Cursor::new(Vec::new()), staging.path())
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_entries_are_written_in_archive_order() {
        let staging = tempfile::tempdir().unwrap();
        // Same name twice: the later entry wins because it is written last
        let mut archive = stored_entry("dup.txt", b"first");
        archive.extend(stored_entry("dup.txt", b"second"));

        let count = ZipExtractor::new()
            .extract(Cursor::new(archive), staging.path())
            .unwrap();

        assert_eq!(count, 2);
        assert_eq!(fs::read(staging.path().join("dup.txt")).unwrap(), b"second");
    }

    #[test]
    fn test_streamed_entries_with_data_descriptors() {
        let staging = tempfile::tempdir().unwrap();
        let mut archive = streamed_entry("a/one.txt", b"one one one one", true);
        archive.extend(streamed_entry("two.txt", b"two", false));
        archive.extend(stored_entry("three.txt", b"three"));

        let count = ZipExtractor::new()
            .extract(Cursor::new(archive), staging.path())
            .unwrap();

        assert_eq!(count, 3);
        assert_eq!(
            fs::read(staging.path().join("a/one.txt")).unwrap(),
            b"one one one one"
        );
        assert_eq!(fs::read(staging.path().join("two.txt")).unwrap(), b"two");
        assert_eq!(
            fs::read(staging.path().join("three.txt")).unwrap(),
            b"three"
        );
    }

    #[test]
    fn test_rejects_non_zip_stream() {
        let staging = tempfile::tempdir().unwrap();
        let result =
            ZipExtractor::new().extract(Cursor::new(b"not a zip file".to_vec()), staging.path());
        assert!(matches!(
            result,
            Err(ExtractionError::InvalidSignature { .. })
        ));
    }

    #[test]
    fn test_rejects_truncated_stream() {
        let staging = tempfile::tempdir().unwrap();
        let mut archive = stored_entry("data.bin", &[1u8; 100]);
        archive.truncate(archive.len() - 10);

        let result = ZipExtractor::new().extract(Cursor::new(archive), staging.path());
        assert!(matches!(result, Err(ExtractionError::Truncated(_))));
    }

    #[test]
    fn test_rejects_truncated_header() {
        let staging = tempfile::tempdir().unwrap();
        let archive = stored_entry("data.bin", b"abc")[..12].to_vec();

        let result = ZipExtractor::new().extract(Cursor::new(archive), staging.path());
        assert!(matches!(result, Err(ExtractionError::Truncated(_))));
    }

    #[test]
    fn test_rejects_paths_outside_staging() {
        let staging = tempfile::tempdir().unwrap();
        let inner = staging.path().join("stage");
        fs::create_dir(&inner).unwrap();

        let result = ZipExtractor::new().extract(
            Cursor::new(stored_entry("../evil.txt", b"x")),
            &inner,
        );
        assert!(matches!(result, Err(ExtractionError::UnsafePath { .. })));
        assert!(!staging.path().join("evil.txt").exists());

        let result = ZipExtractor::new().extract(
            Cursor::new(stored_entry("/etc/evil.txt", b"x")),
            &inner,
        );
        assert!(matches!(result, Err(ExtractionError::UnsafePath { .. })));
    }

    #[test]
    fn test_rejects_unsupported_method() {
        let staging = tempfile::tempdir().unwrap();
        // Method 12 is bzip2
        let mut archive = local_header("data.bz2", 0, 12, 3, 3);
        archive.extend_from_slice(b"abc");

        let result = ZipExtractor::new().extract(Cursor::new(archive), staging.path());
        match result {
            Err(ExtractionError::Unsupported { name, reason }) => {
                assert_eq!(name, "data.bz2");
                assert!(reason.contains("compression method 12"));
            }
            other => panic!("expected unsupported method error, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_encrypted_entries() {
        let staging = tempfile::tempdir().unwrap();
        let mut archive = local_header("secret.txt", FLAG_ENCRYPTED, COMPRESSION_STORED, 3, 3);
        archive.extend_from_slice(b"abc");

        let result = ZipExtractor::new().extract(Cursor::new(archive), staging.path());
        assert!(matches!(result, Err(ExtractionError::Unsupported { .. })));
    }

    #[test]
    fn test_file_entry_over_existing_directory_fails() {
        let staging = tempfile::tempdir().unwrap();
        fs::create_dir(staging.path().join("taken")).unwrap();

        let result = ZipExtractor::new().extract(
            Cursor::new(stored_entry("taken", b"data")),
            staging.path(),
        );
        assert!(matches!(result, Err(ExtractionError::Write { .. })));
    }

    #[test]
    fn test_cursor_reports_entries() {
        let archive = build_zip(
            &[("dir/", None), ("dir/file.txt", Some(b"hello"))],
            CompressionMethod::Stored,
        );
        let mut cursor = ZipCursor::new(Cursor::new(archive));

        let dir = cursor.next_entry().unwrap().unwrap();
        assert_eq!(dir.name, "dir/");
        assert!(dir.is_dir());
        cursor
            .copy_entry(&dir, &mut io::sink(), Path::new("dir"))
            .unwrap();

        let file = cursor.next_entry().unwrap().unwrap();
        assert_eq!(file.name, "dir/file.txt");
        assert!(!file.is_dir());
        assert_eq!(file.uncompressed_size, 5);

        let mut out = Vec::new();
        let written = cursor
            .copy_entry(&file, &mut out, Path::new("dir/file.txt"))
            .unwrap();
        assert_eq!(written, 5);
        assert_eq!(out, b"hello");

        assert!(cursor.next_entry().unwrap().is_none());
        assert!(cursor.next_entry().unwrap().is_none());
    }

    #[test]
    fn test_decode_filename() {
        assert_eq!(decode_filename("日本.txt".as_bytes(), FLAG_UTF8), "日本.txt");
        assert_eq!(decode_filename(&[0x41, 0xe9], 0), "A\u{e9}");
    }

    #[tokio::test]
    async fn test_extract_body_bridges_async_stream() {
        let staging = tempfile::tempdir().unwrap();
        let archive = build_zip(&[("a.txt", Some(b"async"))], CompressionMethod::Deflated);
        let body: ObjectBody = Box::pin(Cursor::new(archive));

        let count = ZipExtractor::new()
            .extract_body(body, staging.path())
            .await
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(fs::read(staging.path().join("a.txt")).unwrap(), b"async");
    }
}
