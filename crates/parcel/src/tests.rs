use crate::*;

use rand::Rng;

// ============================================================================
//  SCALARS
// ============================================================================

#[test]
fn test_scalar_roundtrip() -> Result<()> {
    let mut w = ParcelWriter::new();
    w.void();
    w.bool(true);
    w.bool(false);
    w.i32(i32::MIN);
    w.i32(42);
    w.i64(i64::MAX);
    w.binder(7);

    let bytes = w.into_bytes()?;
    let mut r = ParcelReader::new(&bytes);

    r.void()?;
    assert!(r.bool()?);
    assert!(!r.bool()?);
    assert_eq!(r.i32()?, i32::MIN);
    assert_eq!(r.i32()?, 42);
    assert_eq!(r.i64()?, i64::MAX);
    assert_eq!(r.binder()?, 7);
    r.finish()
}

#[test]
fn test_integers_are_little_endian() -> Result<()> {
    let mut w = ParcelWriter::new();
    w.i32(0x0102_0304);
    let bytes = w.into_bytes()?;
    assert_eq!(bytes, vec![Tag::I32 as u8, 0x04, 0x03, 0x02, 0x01]);
    Ok(())
}

#[test]
fn test_string_and_bytes_roundtrip() -> Result<()> {
    let mut w = ParcelWriter::new();
    w.str("com.android.shell")?;
    w.str("")?;
    w.str("ünïcødé")?;
    w.bytes(&[0, 1, 2, 255])?;

    let bytes = w.into_bytes()?;
    let mut r = ParcelReader::new(&bytes);
    assert_eq!(r.str()?, "com.android.shell");
    assert_eq!(r.str()?, "");
    assert_eq!(r.str()?, "ünïcødé");
    assert_eq!(r.bytes()?, &[0, 1, 2, 255]);
    r.finish()
}

// ============================================================================
//  CONTAINERS
// ============================================================================

#[test]
fn test_list_roundtrip() -> Result<()> {
    let mut w = ParcelWriter::new();
    w.list_header(3)?;
    w.i32(1);
    w.i32(2);
    w.i32(3);

    let bytes = w.into_bytes()?;
    let mut r = ParcelReader::new(&bytes);
    let count = r.list_header()?;
    let items = (0..count).map(|_| r.i32()).collect::<Result<Vec<_>>>()?;
    assert_eq!(items, vec![1, 2, 3]);
    r.finish()
}

#[test]
fn test_struct_length_is_backpatched() -> Result<()> {
    let mut w = ParcelWriter::new();
    w.struct_begin();
    w.i32(5);
    w.str("pkg")?;
    w.struct_end()?;
    w.bool(true);

    let bytes = w.into_bytes()?;
    // tag + len + (i32: 5 bytes) + (str: 1 + 4 + 3 bytes)
    assert_eq!(&bytes[1..5], &13u32.to_le_bytes());

    let mut r = ParcelReader::new(&bytes);
    let mut body = r.struct_body()?;
    assert_eq!(body.i32()?, 5);
    assert_eq!(body.str()?, "pkg");
    body.finish()?;
    assert!(r.bool()?);
    r.finish()
}

#[test]
fn test_nested_structs() -> Result<()> {
    let mut w = ParcelWriter::new();
    w.struct_begin();
    w.struct_begin();
    w.i64(-1);
    w.struct_end()?;
    w.struct_end()?;

    let bytes = w.into_bytes()?;
    let mut r = ParcelReader::new(&bytes);
    let mut outer = r.struct_body()?;
    let mut inner = outer.struct_body()?;
    assert_eq!(inner.i64()?, -1);
    Ok(())
}

#[test]
fn test_open_struct_cannot_finalize() {
    let mut w = ParcelWriter::new();
    w.struct_begin();
    assert_eq!(w.into_bytes().unwrap_err(), Error::ScopeStillOpen);
}

#[test]
fn test_struct_end_without_begin() {
    let mut w = ParcelWriter::new();
    assert_eq!(w.struct_end().unwrap_err(), Error::ScopeUnderflow);
}

#[test]
fn test_skip_nested_values() -> Result<()> {
    let mut w = ParcelWriter::new();
    w.list_header(2)?;
    w.str("a")?;
    w.list_header(1)?;
    w.binder(3);
    w.struct_begin();
    w.i32(9);
    w.struct_end()?;
    w.i32(77);

    let bytes = w.into_bytes()?;
    let mut r = ParcelReader::new(&bytes);
    r.skip()?;
    r.skip()?;
    assert_eq!(r.i32()?, 77);
    r.finish()
}

// ============================================================================
//  MALFORMED INPUT
// ============================================================================

#[test]
fn test_tag_mismatch() -> Result<()> {
    let mut w = ParcelWriter::new();
    w.i32(1);
    let bytes = w.into_bytes()?;

    let mut r = ParcelReader::new(&bytes);
    assert_eq!(
        r.str().unwrap_err(),
        Error::TagMismatch { expected: Tag::String, found: Tag::I32 }
    );
    Ok(())
}

#[test]
fn test_invalid_tag_byte() {
    let r = ParcelReader::new(&[0xEE]);
    assert_eq!(r.peek_tag().unwrap_err(), Error::InvalidTag(0xEE));
}

#[test]
fn test_list_count_checked_before_allocation() {
    // Claims four billion elements with nothing behind it.
    let mut bytes = vec![Tag::List as u8];
    bytes.extend_from_slice(&u32::MAX.to_le_bytes());

    let mut r = ParcelReader::new(&bytes);
    assert_eq!(
        r.list_header().unwrap_err(),
        Error::LengthOverrun { declared: u32::MAX as usize, remaining: 0 }
    );
}

#[test]
fn test_string_length_overrun() {
    let mut bytes = vec![Tag::String as u8];
    bytes.extend_from_slice(&10u32.to_le_bytes());
    bytes.extend_from_slice(b"abc");

    let mut r = ParcelReader::new(&bytes);
    assert!(matches!(r.str(), Err(Error::LengthOverrun { declared: 10, remaining: 3 })));
}

#[test]
fn test_invalid_utf8() {
    let mut bytes = vec![Tag::String as u8];
    bytes.extend_from_slice(&2u32.to_le_bytes());
    bytes.extend_from_slice(&[0xC3, 0x28]);

    let mut r = ParcelReader::new(&bytes);
    assert_eq!(r.str().unwrap_err(), Error::InvalidUtf8);
}

#[test]
fn test_trailing_bytes() -> Result<()> {
    let mut w = ParcelWriter::new();
    w.i32(1);
    w.i32(2);
    let bytes = w.into_bytes()?;

    let mut r = ParcelReader::new(&bytes);
    r.i32()?;
    assert_eq!(r.finish().unwrap_err(), Error::TrailingBytes(5));
    Ok(())
}

#[test]
fn test_skip_rejects_deep_nesting() {
    let mut bytes = Vec::new();
    for _ in 0..200 {
        bytes.push(Tag::List as u8);
        bytes.extend_from_slice(&1u32.to_le_bytes());
    }
    bytes.push(Tag::Void as u8);

    let mut r = ParcelReader::new(&bytes);
    assert_eq!(r.skip().unwrap_err(), Error::NestingTooDeep);
}

#[test]
fn test_truncated_prefixes_never_read_out_of_bounds() -> Result<()> {
    let mut rng = rand::thread_rng();

    for _ in 0..64 {
        let mut w = ParcelWriter::new();
        let n = rng.gen_range(1..6);
        w.list_header(n)?;
        for _ in 0..n {
            w.struct_begin();
            w.i32(rng.r#gen());
            let len = rng.gen_range(0..16);
            let s: String = (0..len).map(|_| rng.gen_range('a'..='z')).collect();
            w.str(&s)?;
            w.struct_end()?;
        }
        let bytes = w.into_bytes()?;

        // A full read succeeds; every strict prefix fails cleanly.
        ParcelReader::new(&bytes).skip()?;
        for cut in 0..bytes.len() {
            let mut r = ParcelReader::new(&bytes[..cut]);
            assert!(r.skip().is_err(), "prefix of {} bytes decoded", cut);
        }
    }
    Ok(())
}
