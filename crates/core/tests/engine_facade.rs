use zign_core::model::{AnalyzedFunction, GraphMetrics, Variable};
use zign_core::services::ListFormat;
use zign_core::{ZignError, Zignatures};

/// An all-zero mask is rejected and nothing is stored.
#[test]
fn zero_mask_is_rejected_without_mutation() {
    let mut engine = Zignatures::new();
    engine.add_address("f", 0x10).expect("address");
    let before = engine.store().to_text();

    let err = engine.add_bytes("f", &[0x55, 0x89], &[0, 0]).expect_err("zero mask");
    assert!(matches!(err, ZignError::Validation(_)));
    assert!(engine.add_bytes("g", &[], &[]).is_err());
    assert!(engine.add_bytes("g", &[0x55], &[0xff, 0xff]).is_err());
    assert_eq!(engine.store().to_text(), before);
}

/// Empty names and names containing separators are rejected.
#[test]
fn invalid_names_are_rejected() {
    let mut engine = Zignatures::new();
    assert!(engine.add_address("", 1).is_err());
    assert!(engine.add_address("a|b", 1).is_err());
    assert!(engine.add_refs("f", Vec::<String>::new()).is_err());
    assert!(engine.add_vars("f", Vec::new()).is_err());
    assert_eq!(engine.count(), 0);
}

/// Hashes must be 64 hex characters and are stored lowercase.
#[test]
fn hash_must_be_sha256_hex_and_is_lowercased() {
    let mut engine = Zignatures::new();
    assert!(engine.add_hash("f", "abcd").is_err());
    assert!(engine.add_hash("f", &"g".repeat(64)).is_err());

    engine.add_hash("f", &"AB".repeat(32)).expect("hash");
    let item = engine.get("f").expect("decode").expect("present");
    assert_eq!(item.hash, Some("ab".repeat(32)));
}

/// The unset-address sentinel cannot be added as a real address.
#[test]
fn unset_sentinel_address_is_rejected() {
    let mut engine = Zignatures::new();
    assert!(engine.add_address("f", u64::MAX).is_err());
    assert!(engine.add_address("f", 0).is_ok());
}

/// Adds land in the currently selected space.
#[test]
fn adds_target_the_current_space() {
    let mut engine = Zignatures::new();
    engine.select_space(Some("libc")).expect("select");
    engine.add_address("strlen", 0x2000).expect("add");

    assert!(engine.store().contains(Some("libc"), "strlen"));
    assert!(!engine.store().contains(None, "strlen"));

    engine.push_space(None).expect("push");
    engine.add_address("main", 0x1000).expect("add");
    assert!(engine.store().contains(None, "main"));
    assert!(engine.pop_space());
    assert_eq!(engine.current_space(), Some("libc"));
}

/// A named delete only touches the selected space; `*` clears that space,
/// or everything with no selection.
#[test]
fn delete_single_and_wildcard() {
    let mut engine = Zignatures::new();
    engine.select_space(Some("a")).expect("select");
    engine.add_address("x", 1).expect("x");
    engine.add_address("y", 2).expect("y");
    engine.select_space(Some("b")).expect("select");
    engine.add_address("x", 3).expect("x");

    assert_eq!(engine.delete("x").expect("delete"), 1);
    assert!(matches!(engine.delete("x"), Err(ZignError::NotFound(_))));

    engine.select_space(Some("a")).expect("select");
    assert_eq!(engine.delete("*").expect("delete all in a"), 2);

    engine.select_space(Some("b")).expect("select");
    engine.add_address("z", 4).expect("z");
    engine.select_space(None).expect("clear");
    engine.add_address("g", 5).expect("g");
    assert_eq!(engine.delete("*").expect("delete everything"), 2);
    assert_eq!(engine.count(), 0);
}

/// get_list and foreach see the selected space, or everything with no selection.
#[test]
fn get_list_and_foreach_cover_scope() {
    let mut engine = Zignatures::new();
    engine.add_address("global", 1).expect("global");
    engine.select_space(Some("s")).expect("select");
    engine.add_address("scoped", 2).expect("scoped");

    let scoped: Vec<String> = engine.get_list().into_iter().map(|i| i.name).collect();
    assert_eq!(scoped, vec!["scoped"]);

    engine.select_space(None).expect("clear");
    let mut names = Vec::new();
    let report = engine.foreach(|item| {
        names.push(item.name);
        true
    });
    assert_eq!(names, vec!["global", "scoped"]);
    assert_eq!(report.visited, 2);
}

/// Text and JSON listings carry every field of an item, with `-1` for an
/// unset address.
#[test]
fn list_formats_render_every_item() {
    let mut engine = Zignatures::new();
    engine.select_space(Some("libc")).expect("select");
    engine.add_bytes("memcpy", &[0x48, 0x89, 0xf8], &[0xff, 0xf0, 0xff]).expect("bytes");
    engine.add_graph("memcpy", GraphMetrics::new(1, 1, 0, 1, 24)).expect("graph");
    engine.add_vars("memcpy", vec![Variable::register(0)]).expect("vars");
    engine.select_space(None).expect("clear");

    let text = engine.list(ListFormat::Text).expect("text");
    assert!(text.starts_with("(libc) memcpy:\n"));
    assert!(text.contains("  bytes: 488.f8\n"));
    assert!(text.contains("  graph: cc=1 nbbs=1 edges=0 ebbs=1 bbsum=24\n"));
    assert!(text.contains("  vars: r0\n"));

    let json: serde_json::Value =
        serde_json::from_str(&engine.list(ListFormat::Json).expect("json")).expect("parse");
    assert_eq!(json[0]["name"], "memcpy");
    assert_eq!(json[0]["zignspace"], "libc");
    assert_eq!(json[0]["addr"], -1);
    assert_eq!(json[0]["graph"]["bbsum"], 24);

    let commands = engine.list(ListFormat::Commands).expect("commands");
    assert!(commands.starts_with("zs libc\n"));
    assert!(commands.contains("za memcpy g cc=1 nbbs=1 edges=0 ebbs=1 bbsum=24\n"));
}

/// Space rename and unset through the engine keep signatures reachable.
#[test]
fn rename_and_unset_through_engine() {
    let mut engine = Zignatures::new();
    engine.select_space(Some("old")).expect("select");
    engine.add_address("f", 1).expect("f");

    assert_eq!(engine.rename_space("old", "new").expect("rename"), 1);
    assert_eq!(engine.current_space(), Some("new"));
    assert_eq!(engine.get("f").expect("decode").expect("present").addr, Some(1));

    assert_eq!(engine.unset_space("new").expect("unset"), 1);
    assert_eq!(engine.current_space(), None);
    let spaces: Vec<String> = engine.spaces().into_iter().map(|s| s.name).collect();
    assert!(spaces.is_empty());
    assert_eq!(engine.get("f").expect("decode").expect("present").space, None);
}

/// Graph metrics computed from a function survive the store unchanged.
#[test]
fn graph_from_function_round_trips_through_store() {
    let fcn = AnalyzedFunction::new("f", 0x1000).with_block(0x1000, 6).with_cfg(1, 0, 1);
    let mut engine = Zignatures::new();
    engine.add_graph_from("f", &fcn).expect("graph");
    let item = engine.get("f").expect("decode").expect("present");
    assert_eq!(item.graph, Some(GraphMetrics::new(1, 1, 0, 1, 6)));
}
