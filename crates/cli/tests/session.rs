use std::fs;

use tempfile::tempdir;
use zign_cli::{parse_address, Session};

/// Addresses may be `0x`/`0X` hex or decimal, with surrounding whitespace.
#[test]
fn parse_address_accepts_hex_and_decimal() {
    assert_eq!(parse_address("0x401000").expect("hex"), 0x401000);
    assert_eq!(parse_address("0X10").expect("upper hex"), 16);
    assert_eq!(parse_address(" 4096 ").expect("decimal"), 4096);
}

/// Non-numeric and negative addresses are rejected.
#[test]
fn parse_address_rejects_garbage() {
    let err = parse_address("0xnope").unwrap_err();
    assert!(err.to_string().contains("Invalid address"));
    assert!(parse_address("-1").is_err());
}

/// Opening a missing db gives an empty, unscoped engine.
#[test]
fn open_without_db_starts_empty() {
    let dir = tempdir().expect("tempdir");
    let session = Session::open(&dir.path().join("absent.zign"), None, None).expect("open");
    assert!(session.engine.store().is_empty());
    assert_eq!(session.engine.current_space(), None);
}

/// persist creates missing parent directories, and a reopened session sees
/// the saved signature in its space.
#[test]
fn persist_creates_parent_dirs_and_reloads() {
    let dir = tempdir().expect("tempdir");
    let db = dir.path().join("nested").join("sigs.zign");

    let mut session = Session::open(&db, None, Some("libc")).expect("open");
    session.engine.add_address("puts", 0x1000).expect("add");
    session.persist().expect("persist");

    let reopened = Session::open(&db, None, Some("libc")).expect("reopen");
    let item = reopened.engine.get("puts").expect("decode").expect("present");
    assert_eq!(item.addr, Some(0x1000));
    assert_eq!(item.space.as_deref(), Some("libc"));
}

/// Persisting an emptied store truncates the file instead of failing.
#[test]
fn persist_of_empty_store_leaves_empty_file() {
    let dir = tempdir().expect("tempdir");
    let db = dir.path().join("sigs.zign");

    let mut session = Session::open(&db, None, None).expect("open");
    session.engine.add_address("f", 1).expect("add");
    session.persist().expect("persist");
    session.engine.delete("*").expect("delete");
    session.persist().expect("persist empty");

    assert_eq!(fs::read_to_string(&db).expect("read"), "");
    let reopened = Session::open(&db, None, None).expect("reopen");
    assert!(reopened.engine.store().is_empty());
}

/// Space names containing codec separators are refused on open.
#[test]
fn invalid_space_name_is_rejected() {
    let dir = tempdir().expect("tempdir");
    let err = Session::open(&dir.path().join("sigs.zign"), None, Some("bad|space")).unwrap_err();
    assert!(err.to_string().contains("Failed to select space"));
}
