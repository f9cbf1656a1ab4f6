use crate::format::{decode_record, validate_footer_pointer, write_record, FooterRecord};
use crate::*;
use anyhow::Result;
use byteorder::{LittleEndian, WriteBytesExt};
use std::path::Path;
use tempfile::tempdir;

const STRATEGIES: [ReadStrategy; 2] = [ReadStrategy::Mapped, ReadStrategy::Seek];

/// Assembles a file from raw parts: data, footer bytes, then a pointer.
fn raw_file(dir: &Path, name: &str, data: &[u8], footer: &[u8], pointer: i64) -> Result<std::path::PathBuf> {
    let path = dir.join(name);
    let mut bytes = data.to_vec();
    bytes.extend_from_slice(footer);
    bytes.write_i64::<LittleEndian>(pointer)?;
    std::fs::write(&path, bytes)?;
    Ok(path)
}

fn header(tag: i32, begin: i64, end: i64) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.write_i32::<LittleEndian>(tag).unwrap();
    buf.write_i64::<LittleEndian>(begin).unwrap();
    buf.write_i64::<LittleEndian>(end).unwrap();
    buf
}

fn open_err(path: &Path, strategy: ReadStrategy) -> ConstDbError {
    read_with(path, ReadOptions::new().strategy(strategy)).unwrap_err()
}

// -------------------- Record codec --------------------

#[test]
fn record_codec_handles_both_key_types() -> Result<()> {
    let mut buf = Vec::new();
    write_record(&mut buf, &Key::from(-7), 3, 9)?;
    write_record(&mut buf, &Key::from("ключ"), 9, 9)?;
    assert_eq!(buf.len() as u64, record_len(&Key::from(-7)) + record_len(&Key::from("ключ")));

    let (first, used) = decode_record(&buf, 0, 100)?;
    assert_eq!(
        first,
        FooterRecord {
            key: Key::Integer(-7),
            begin: 3,
            end: 9
        }
    );
    assert_eq!(used, RECORD_HEADER_BYTES + 8);

    let (second, used2) = decode_record(&buf, used, 100)?;
    assert_eq!(second.key, Key::Text("ключ".into()));
    assert_eq!((second.begin, second.end), (9, 9));
    assert_eq!(used + used2, buf.len());
    Ok(())
}

#[test]
fn footer_pointer_bounds() {
    assert_eq!(validate_footer_pointer(0, 8).unwrap(), 0);
    assert_eq!(validate_footer_pointer(12, 20).unwrap(), 12);
    assert!(validate_footer_pointer(13, 20).unwrap_err().is_corrupt());
    assert!(validate_footer_pointer(-1, 20).unwrap_err().is_corrupt());
    assert!(validate_footer_pointer(0, 7).unwrap_err().is_corrupt());
}

// -------------------- Corrupt files --------------------

#[test]
fn file_shorter_than_pointer_is_corrupt() -> Result<()> {
    let dir = tempdir()?;
    let short = dir.path().join("short.cdb");
    std::fs::write(&short, [1u8, 2, 3])?;
    let empty = dir.path().join("empty.cdb");
    std::fs::write(&empty, b"")?;

    for strategy in STRATEGIES {
        assert!(open_err(&short, strategy).is_corrupt());
        assert!(open_err(&empty, strategy).is_corrupt());
    }
    Ok(())
}

#[test]
fn pointer_past_end_is_corrupt() -> Result<()> {
    let dir = tempdir()?;
    let past = raw_file(dir.path(), "past.cdb", b"abcd", &[], 5)?;
    let negative = raw_file(dir.path(), "neg.cdb", b"abcd", &[], -4)?;

    for strategy in STRATEGIES {
        assert!(open_err(&past, strategy).is_corrupt());
        assert!(open_err(&negative, strategy).is_corrupt());
    }
    Ok(())
}

#[test]
fn truncated_record_is_corrupt() -> Result<()> {
    let dir = tempdir()?;
    let mut footer = header(INT_KEY_TYPE, 0, 4);
    footer.extend_from_slice(&[0u8; 3]); // key needs 8 bytes
    let path = raw_file(dir.path(), "trunc.cdb", b"abcd", &footer, 4)?;

    let partial = header(INT_KEY_TYPE, 0, 4);
    let short_header = raw_file(dir.path(), "hdr.cdb", b"abcd", &partial[..10], 4)?;

    for strategy in STRATEGIES {
        assert!(open_err(&path, strategy).is_corrupt());
        assert!(open_err(&short_header, strategy).is_corrupt());
    }
    Ok(())
}

#[test]
fn key_length_past_footer_is_corrupt() -> Result<()> {
    let dir = tempdir()?;
    let mut footer = header(STR_KEY_TYPE, 0, 4);
    footer.write_i64::<LittleEndian>(50)?;
    footer.extend_from_slice(b"short");
    let long = raw_file(dir.path(), "long.cdb", b"abcd", &footer, 4)?;

    let mut footer = header(STR_KEY_TYPE, 0, 4);
    footer.write_i64::<LittleEndian>(-1)?;
    let negative = raw_file(dir.path(), "negkey.cdb", b"abcd", &footer, 4)?;

    for strategy in STRATEGIES {
        assert!(open_err(&long, strategy).is_corrupt());
        assert!(open_err(&negative, strategy).is_corrupt());
    }
    Ok(())
}

#[test]
fn invalid_utf8_key_is_corrupt() -> Result<()> {
    let dir = tempdir()?;
    let mut footer = header(STR_KEY_TYPE, 0, 4);
    footer.write_i64::<LittleEndian>(2)?;
    footer.extend_from_slice(&[0xC3, 0x28]);
    let path = raw_file(dir.path(), "utf8.cdb", b"abcd", &footer, 4)?;

    for strategy in STRATEGIES {
        assert!(open_err(&path, strategy).is_corrupt());
    }
    Ok(())
}

#[test]
fn range_outside_data_segment_is_corrupt() -> Result<()> {
    let dir = tempdir()?;
    let mut past = header(INT_KEY_TYPE, 2, 9);
    past.write_i64::<LittleEndian>(1)?;
    let past = raw_file(dir.path(), "range.cdb", b"abcd", &past, 4)?;

    let mut inverted = header(INT_KEY_TYPE, 3, 1);
    inverted.write_i64::<LittleEndian>(1)?;
    let inverted = raw_file(dir.path(), "inv.cdb", b"abcd", &inverted, 4)?;

    for strategy in STRATEGIES {
        assert!(open_err(&past, strategy).is_corrupt());
        assert!(open_err(&inverted, strategy).is_corrupt());
    }
    Ok(())
}

#[test]
fn unknown_key_type_is_corrupt() -> Result<()> {
    let dir = tempdir()?;
    let mut footer = header(9, 0, 4);
    footer.write_i64::<LittleEndian>(1)?;
    let path = raw_file(dir.path(), "tag.cdb", b"abcd", &footer, 4)?;

    for strategy in STRATEGIES {
        assert!(open_err(&path, strategy).is_corrupt());
    }
    Ok(())
}

#[test]
fn reserved_bytes_key_type_is_corrupt() -> Result<()> {
    let dir = tempdir()?;
    let mut footer = header(BYTES_KEY_TYPE, 0, 4);
    footer.write_i64::<LittleEndian>(1)?;
    footer.push(0xFF);
    let path = raw_file(dir.path(), "bytes.cdb", b"abcd", &footer, 4)?;

    for strategy in STRATEGIES {
        let err = open_err(&path, strategy);
        assert!(err.is_corrupt(), "got {:?}", err);
        assert!(err.to_string().contains("byte-string"));
    }
    Ok(())
}

#[test]
fn duplicate_footer_key_is_corrupt() -> Result<()> {
    let dir = tempdir()?;
    let mut footer = Vec::new();
    write_record(&mut footer, &Key::from(1), 0, 2)?;
    write_record(&mut footer, &Key::from(1), 2, 4)?;
    let path = raw_file(dir.path(), "dupe.cdb", b"abcd", &footer, 4)?;

    for strategy in STRATEGIES {
        assert!(open_err(&path, strategy).is_corrupt());
    }
    Ok(())
}

// -------------------- Key conversions --------------------

#[test]
fn oversized_integers_are_invalid_key_type() {
    assert_eq!(Key::try_from(5u64).unwrap(), Key::Integer(5));
    assert!(matches!(Key::try_from(u64::MAX), Err(ConstDbError::InvalidKeyType(_))));
    assert!(matches!(
        Key::try_from(i128::from(i64::MIN) - 1),
        Err(ConstDbError::InvalidKeyType(_))
    ));
}

#[test]
fn key_display_and_tags() {
    assert_eq!(Key::from(-3).to_string(), "-3");
    assert_eq!(Key::from("a b").to_string(), "\"a b\"");
    assert_eq!(Key::from(1).type_tag(), INT_KEY_TYPE);
    assert_eq!(Key::from("1").type_tag(), STR_KEY_TYPE);
    assert_ne!(Key::from(1), Key::from("1"));
    assert_eq!(Key::from("x").as_text(), Some("x"));
    assert_eq!(Key::from(9).as_integer(), Some(9));
}
