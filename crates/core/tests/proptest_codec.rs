//! Property-based tests for the signature codec and merge.

use proptest::option;
use proptest::prelude::*;

use zign_core::db::codec::{decode, encode};
use zign_core::model::{BytePattern, GraphMetrics, SignatureItem, VarKind, Variable};

fn token() -> impl Strategy<Value = String> {
    "[A-Za-z_.][A-Za-z0-9_.]{0,15}"
}

fn pattern() -> impl Strategy<Value = BytePattern> {
    (1usize..32)
        .prop_flat_map(|len| {
            (prop::collection::vec(any::<u8>(), len), prop::collection::vec(any::<u8>(), len))
        })
        .prop_filter_map("mask must not be all zero", |(bytes, mask)| {
            BytePattern::new(bytes, mask).ok()
        })
}

fn graph() -> impl Strategy<Value = GraphMetrics> {
    (-1i32..64, -1i32..64, -1i32..64, -1i32..8, -1i32..4096)
        .prop_map(|(cc, nbbs, edges, ebbs, bbsum)| GraphMetrics::new(cc, nbbs, edges, ebbs, bbsum))
}

fn variable() -> impl Strategy<Value = Variable> {
    (
        prop_oneof![
            Just(VarKind::BasePointer),
            Just(VarKind::StackPointer),
            Just(VarKind::Register)
        ],
        -4096i64..4096,
    )
        .prop_map(|(kind, delta)| Variable::new(kind, delta))
}

fn item() -> impl Strategy<Value = SignatureItem> {
    (
        token(),
        option::of(token()),
        option::of(0u64..u64::MAX),
        option::of(pattern()),
        option::of(graph()),
        option::of("[0-9a-f]{64}"),
        option::of(prop::collection::vec(token(), 1..6)),
        option::of(prop::collection::vec(variable(), 1..6)),
    )
        .prop_map(|(name, space, addr, bytes, graph, hash, refs, vars)| SignatureItem {
            name,
            space,
            addr,
            bytes,
            graph,
            hash,
            refs,
            vars,
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(512))]

    /// Decoding an encoded item yields the same item, field for field.
    #[test]
    fn decode_inverts_encode(item in item()) {
        let (key, value) = encode(&item);
        let back = decode(&key, &value).expect("decode");
        prop_assert_eq!(back, item);
    }

    /// Encoded values always carry exactly eight fields.
    #[test]
    fn value_has_eight_fields(item in item()) {
        let (_, value) = encode(&item);
        prop_assert_eq!(value.split('|').count(), 8);
    }

    /// Merging an item into itself changes nothing.
    #[test]
    fn merge_is_idempotent(item in item()) {
        let mut merged = item.clone();
        merged.merge_from(&item);
        prop_assert_eq!(merged, item);
    }

    /// A merge never drops a field the update does not carry.
    #[test]
    fn merge_keeps_unspecified_fields(base in item(), update in item()) {
        let mut merged = base.clone();
        merged.merge_from(&update);
        if update.addr.is_none() {
            prop_assert_eq!(merged.addr, base.addr);
        }
        if update.refs.is_none() {
            prop_assert_eq!(&merged.refs, &base.refs);
        }
        if update.bytes.is_none() {
            prop_assert_eq!(&merged.bytes, &base.bytes);
        }
        if update.hash.is_none() {
            prop_assert_eq!(&merged.hash, &base.hash);
        }
    }

    /// Decoding arbitrary text never panics.
    #[test]
    fn decode_never_panics(key in ".{0,40}", value in ".{0,80}") {
        let _ = decode(&key, &value);
    }
}
