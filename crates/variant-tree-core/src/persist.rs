//! Reading and writing value streams.
//!
//! A stream is a sequence of consecutively encoded values. Writing a
//! [`Variant::List`] emits its elements one after another; reading collects
//! several values back into a list. One consequence:
//!
//! - a list with two or more elements round-trips unchanged,
//! - a one-element list reads back as its single element,
//! - an empty list or [`Variant::Invalid`] writes nothing and reads back as
//!   [`Variant::Invalid`].
//!
//! Values are encoded with `bincode` using fixed-width integers.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use bincode::Options;

use crate::error::CodecError;
use crate::logging::targets;
use crate::value::Variant;

/// Result type alias for codec operations.
pub type CodecResult<T> = std::result::Result<T, CodecError>;

fn encoder() -> impl Options {
    bincode::DefaultOptions::new().with_fixint_encoding()
}

fn decoder(limit: usize) -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .with_limit(limit as u64)
}

fn map_decode_error(err: bincode::Error) -> CodecError {
    match *err {
        bincode::ErrorKind::Io(ref io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
            CodecError::TruncatedStream
        }
        bincode::ErrorKind::SizeLimit => CodecError::TruncatedStream,
        other => CodecError::CorruptData(other.to_string()),
    }
}

fn map_encode_error(err: bincode::Error) -> CodecError {
    match *err {
        bincode::ErrorKind::Io(io) => CodecError::io("<stream>", io),
        other => CodecError::CorruptData(other.to_string()),
    }
}

/// Decode every value in `bytes`.
pub fn decode(bytes: &[u8]) -> CodecResult<Variant> {
    let mut remaining = bytes;
    let mut values = Vec::new();
    while !remaining.is_empty() {
        let value: Variant = decoder(remaining.len())
            .deserialize_from(&mut remaining)
            .map_err(map_decode_error)?;
        values.push(value);
    }

    tracing::trace!(target: targets::CODEC, count = values.len(), "decoded values");
    Ok(match values.len() {
        0 => Variant::Invalid,
        1 => values.pop().unwrap_or_default(),
        _ => Variant::from(values),
    })
}

/// Encode a value with the list-as-sequence convention.
pub fn encode(value: &Variant) -> CodecResult<Vec<u8>> {
    let mut bytes = Vec::new();
    write_all(&mut bytes, value)?;
    Ok(bytes)
}

/// Read a whole stream.
///
/// # Errors
///
/// [`CodecError::TruncatedStream`] if the stream ends inside a value,
/// [`CodecError::CorruptData`] if it holds undecodable bytes.
pub fn read_all<R: Read>(mut reader: R) -> CodecResult<Variant> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| CodecError::io("<stream>", e))?;
    decode(&bytes)
}

/// Write a value to a stream.
pub fn write_all<W: Write>(mut writer: W, value: &Variant) -> CodecResult<()> {
    match value {
        Variant::Invalid => {}
        Variant::List(items) => {
            for item in items.iter() {
                encoder()
                    .serialize_into(&mut writer, item)
                    .map_err(map_encode_error)?;
            }
        }
        other => encoder()
            .serialize_into(&mut writer, other)
            .map_err(map_encode_error)?,
    }
    writer.flush().map_err(|e| CodecError::io("<stream>", e))
}

/// Read a value file.
pub fn read_file(path: impl AsRef<Path>) -> CodecResult<Variant> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| CodecError::io(path, e))?;
    read_all(BufReader::new(file)).inspect_err(|err| {
        tracing::warn!(target: targets::CODEC, path = %path.display(), error = %err, "failed to read value file");
    })
}

/// Write a value file, replacing any existing content.
pub fn write_file(path: impl AsRef<Path>, value: &Variant) -> CodecResult<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| CodecError::io(path, e))?;
    write_all(BufWriter::new(file), value).map_err(|err| match err {
        CodecError::Io { source, .. } => CodecError::io(path, source),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Variant {
        Variant::ordered_map([
            ("name", Variant::from("tree")),
            ("count", Variant::from(3u64)),
            ("ratio", Variant::from(0.5)),
            ("items", Variant::list([Variant::from(-1), Variant::Invalid, Variant::from(true)])),
            ("hash", Variant::unordered_map([("k", 1)])),
        ])
    }

    #[test]
    fn test_single_value_round_trip() {
        let value = sample();
        assert_eq!(decode(&encode(&value).unwrap()).unwrap(), value);
    }

    #[test]
    fn test_list_convention() {
        let list = Variant::list([sample(), Variant::from(1)]);
        assert_eq!(decode(&encode(&list).unwrap()).unwrap(), list);

        let single = Variant::list([Variant::from("only")]);
        assert_eq!(decode(&encode(&single).unwrap()).unwrap(), Variant::from("only"));

        let empty = Variant::list(Vec::<Variant>::new());
        assert!(encode(&empty).unwrap().is_empty());
        assert_eq!(decode(&[]).unwrap(), Variant::Invalid);
        assert!(encode(&Variant::Invalid).unwrap().is_empty());
    }

    #[test]
    fn test_truncated_stream() {
        let bytes = encode(&sample()).unwrap();
        for cut in [1, bytes.len() / 2, bytes.len() - 1] {
            let err = decode(&bytes[..cut]).unwrap_err();
            assert!(matches!(err, CodecError::TruncatedStream), "cut at {cut}: {err:?}");
        }
    }

    #[test]
    fn test_corrupt_tag() {
        let bytes = [0xff, 0xff, 0xff, 0x7f, 0, 0, 0, 0];
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::CorruptData(_)));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.bin");
        let value = Variant::list([Variant::from(1), Variant::from("two")]);
        write_file(&path, &value).unwrap();
        assert_eq!(read_file(&path).unwrap(), value);
        assert!(matches!(
            read_file(dir.path().join("missing.bin")),
            Err(CodecError::Io { .. })
        ));
    }
}
