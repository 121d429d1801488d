//! Transparent decompression of input documents.
//!
//! Large GeoJSON exports are often shipped compressed. [`open_input`] picks a
//! codec by file extension first and falls back to the stream's magic bytes,
//! so `runs.geojson.gz` and a gzip file without the suffix both read as plain
//! text. Decompression is streaming; nothing is buffered beyond the reader's
//! own window.
//!
//! Built-in codecs, each behind a feature flag:
//! - **Gzip** (`.gz`, `.gzip`) via `flate2` (feature: `compression-gzip`)
//! - **Zstd** (`.zst`, `.zstd`) via `zstd` (feature: `compression-zstd`)

use crate::error::SplitError;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::Path;

/// A decompressor for one input format.
pub trait InputCodec: Send + Sync {
    /// Human-readable codec name (e.g., "gzip").
    fn name(&self) -> &str;

    /// Lowercase file extensions, including the leading dot.
    fn extensions(&self) -> &[&str];

    /// Leading bytes that identify the format.
    fn magic_bytes(&self) -> &[u8];

    /// Wrap a reader with decompression.
    fn wrap_reader(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>>;
}

fn codecs() -> Vec<Box<dyn InputCodec>> {
    vec![
        #[cfg(feature = "compression-gzip")]
        Box::new(GzipCodec),
        #[cfg(feature = "compression-zstd")]
        Box::new(ZstdCodec),
    ]
}

fn detect_from_extension(path: &Path) -> Option<Box<dyn InputCodec>> {
    let name = path.to_string_lossy().to_lowercase();
    codecs()
        .into_iter()
        .find(|c| c.extensions().iter().any(|ext| name.ends_with(ext)))
}

/// Peek at the start of the stream without consuming it.
fn detect_from_magic<R: BufRead>(reader: &mut R) -> Option<Box<dyn InputCodec>> {
    let buf = reader.fill_buf().ok()?;
    if buf.is_empty() {
        return None;
    }
    codecs()
        .into_iter()
        .find(|c| buf.starts_with(c.magic_bytes()))
}

/// Wrap `reader` with a decompressor when `path_hint` or the stream's magic
/// bytes call for one.
///
/// # Errors
///
/// Returns an error if the codec fails to initialise on the stream.
pub fn auto_detect_reader<R: Read + 'static>(
    reader: R,
    path_hint: impl AsRef<Path>,
) -> Result<Box<dyn BufRead>> {
    if let Some(codec) = detect_from_extension(path_hint.as_ref()) {
        let inner = codec
            .wrap_reader(Box::new(reader))
            .with_context(|| format!("wrap reader with {} codec", codec.name()))?;
        return Ok(Box::new(BufReader::new(inner)));
    }

    let mut buffered = BufReader::new(reader);
    if let Some(codec) = detect_from_magic(&mut buffered) {
        let inner = codec
            .wrap_reader(Box::new(buffered))
            .with_context(|| format!("wrap reader with {} codec", codec.name()))?;
        return Ok(Box::new(BufReader::new(inner)));
    }

    Ok(Box::new(buffered))
}

/// Open an input document for line-oriented reading.
///
/// # Errors
///
/// Returns [`SplitError::InputNotFound`] if `path` does not exist, or an I/O
/// error with context if it cannot be opened or decompressed.
pub fn open_input(path: impl AsRef<Path>) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let f = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(SplitError::InputNotFound(path.to_path_buf()).into());
        }
        Err(e) => return Err(e).with_context(|| format!("open {}", path.display())),
    };
    auto_detect_reader(f, path)
        .with_context(|| format!("setup decompression for {}", path.display()))
}

#[cfg(feature = "compression-gzip")]
struct GzipCodec;

#[cfg(feature = "compression-gzip")]
impl InputCodec for GzipCodec {
    fn name(&self) -> &str {
        "gzip"
    }

    fn extensions(&self) -> &[&str] {
        &[".gz", ".gzip"]
    }

    fn magic_bytes(&self) -> &[u8] {
        &[0x1f, 0x8b]
    }

    fn wrap_reader(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        use flate2::read::MultiGzDecoder;
        Ok(Box::new(MultiGzDecoder::new(reader)))
    }
}

#[cfg(feature = "compression-zstd")]
struct ZstdCodec;

#[cfg(feature = "compression-zstd")]
impl InputCodec for ZstdCodec {
    fn name(&self) -> &str {
        "zstd"
    }

    fn extensions(&self) -> &[&str] {
        &[".zst", ".zstd"]
    }

    fn magic_bytes(&self) -> &[u8] {
        &[0x28, 0xb5, 0x2f, 0xfd]
    }

    fn wrap_reader(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        zstd::stream::read::Decoder::new(reader).map(|d| Box::new(d) as Box<dyn Read>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;

    #[test]
    fn plain_file_passes_through() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("plain.json");
        fs::write(&path, "line one\nline two\n")?;
        let lines: Vec<String> = open_input(&path)?.lines().collect::<std::io::Result<_>>()?;
        assert_eq!(lines, vec!["line one", "line two"]);
        Ok(())
    }

    #[test]
    fn missing_file_is_input_not_found() {
        let err = open_input("/definitely/not/here.json").err().unwrap();
        assert!(matches!(
            err.downcast_ref::<SplitError>(),
            Some(SplitError::InputNotFound(_))
        ));
    }

    #[cfg(feature = "compression-gzip")]
    #[test]
    fn gzip_by_extension_and_by_magic() -> Result<()> {
        use flate2::Compression;
        use flate2::write::GzEncoder;

        let tmp = tempfile::tempdir()?;
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"{\"features\": []}\n")?;
        let bytes = enc.finish()?;

        for name in ["doc.json.gz", "doc.json"] {
            let path = tmp.path().join(name);
            fs::write(&path, &bytes)?;
            let mut text = String::new();
            open_input(&path)?.read_to_string(&mut text)?;
            assert_eq!(text, "{\"features\": []}\n");
        }
        Ok(())
    }

    #[cfg(feature = "compression-zstd")]
    #[test]
    fn zstd_by_extension() -> Result<()> {
        let tmp = tempfile::tempdir()?;
        let path = tmp.path().join("doc.json.zst");
        fs::write(&path, zstd::encode_all(&b"{\"features\": []}\n"[..], 3)?)?;
        let mut text = String::new();
        open_input(&path)?.read_to_string(&mut text)?;
        assert_eq!(text, "{\"features\": []}\n");
        Ok(())
    }
}
