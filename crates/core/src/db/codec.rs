//! Mapping between a `SignatureItem` and its `(key, value)` storage pair.
//!
//! ```text
//! key   := "sig|" SPACE "|" NAME            ; SPACE = "*" if none
//! value := SIZE "|" HEXBYTES "|" HEXMASK "|" HEXGRAPH "|" ADDR "|" REFS "|" VARS "|" HASH
//! ```
//!
//! `ADDR` is decimal, or `-1` when unset. Decoding is all-or-nothing: an
//! error never yields a half-populated item.

use crate::error::{ZignError, ZignResult};
use crate::model::{BytePattern, GraphMetrics, SignatureItem, Variable, GLOBAL_SPACE};

/// First key component of every signature entry.
pub const KEY_PREFIX: &str = "sig";

/// Serialized form of an unset address.
pub const ADDR_UNSET: &str = "-1";

const KEY_FIELDS: usize = 3;
const VALUE_FIELDS: usize = 8;

/// Build the storage key for `(space, name)`.
pub fn key_for(space: Option<&str>, name: &str) -> String {
    format!("{}{}", space_prefix(space), name)
}

/// Key prefix shared by every member of `space`: exactly `"sig|<space>|"`.
pub fn space_prefix(space: Option<&str>) -> String {
    format!("{KEY_PREFIX}|{}|", space.unwrap_or(GLOBAL_SPACE))
}

/// Split a key into `(space, name)` without decoding the value.
pub fn split_key(key: &str) -> ZignResult<(Option<&str>, &str)> {
    let fields: Vec<&str> = key.split('|').collect();
    if fields.len() != KEY_FIELDS {
        return Err(ZignError::format(
            key,
            format!("key has {} fields, expected {KEY_FIELDS}", fields.len()),
        ));
    }
    if fields[0] != KEY_PREFIX {
        return Err(ZignError::format(key, format!("key does not start with `{KEY_PREFIX}`")));
    }
    if fields[1].is_empty() || fields[2].is_empty() {
        return Err(ZignError::format(key, "empty space or name"));
    }
    let space = if fields[1] == GLOBAL_SPACE { None } else { Some(fields[1]) };
    Ok((space, fields[2]))
}

/// Serialize an item into its storage pair.
pub fn encode(item: &SignatureItem) -> (String, String) {
    let key = key_for(item.space.as_deref(), &item.name);

    let (size, hexbytes, hexmask) = match &item.bytes {
        Some(p) => (p.len(), hex::encode(p.bytes()), hex::encode(p.mask())),
        None => (0, String::new(), String::new()),
    };
    let hexgraph = item.graph.map(|g| hex::encode(g.to_bytes())).unwrap_or_default();
    let addr = item.addr.map(|a| a.to_string()).unwrap_or_else(|| ADDR_UNSET.to_string());
    let refs = item.refs.as_ref().map(|r| r.join(",")).unwrap_or_default();
    let vars = item
        .vars
        .as_ref()
        .map(|v| v.iter().map(Variable::to_string).collect::<Vec<_>>().join(","))
        .unwrap_or_default();
    let hash = item.hash.as_deref().unwrap_or_default();

    let value = format!("{size}|{hexbytes}|{hexmask}|{hexgraph}|{addr}|{refs}|{vars}|{hash}");
    (key, value)
}

/// Deserialize a storage pair.
pub fn decode(key: &str, value: &str) -> ZignResult<SignatureItem> {
    let (space, name) = split_key(key)?;

    let fields: Vec<&str> = value.split('|').collect();
    if fields.len() != VALUE_FIELDS {
        return Err(ZignError::format(
            key,
            format!("value has {} fields, expected {VALUE_FIELDS}", fields.len()),
        ));
    }

    let size: usize = fields[0]
        .parse()
        .map_err(|_| ZignError::format(key, format!("invalid pattern size `{}`", fields[0])))?;
    let bytes = decode_pattern(key, size, fields[1], fields[2])?;
    let graph = decode_graph(key, fields[3])?;
    let addr = decode_addr(key, fields[4])?;
    let refs = decode_list(fields[5], |r| Ok(r.to_string()), key)?;
    let vars = decode_list(fields[6], |v| v.parse::<Variable>(), key)?;
    let hash = decode_hash(key, fields[7])?;

    let item = SignatureItem {
        name: name.to_string(),
        space: space.map(str::to_string),
        addr,
        bytes,
        graph,
        hash,
        refs,
        vars,
    };
    item.validate().map_err(|e| ZignError::format(key, e.to_string()))?;
    Ok(item)
}

fn decode_hex(key: &str, what: &str, text: &str) -> ZignResult<Vec<u8>> {
    if text.len() % 2 != 0 {
        return Err(ZignError::format(key, format!("{what} hex has odd length {}", text.len())));
    }
    hex::decode(text).map_err(|e| ZignError::format(key, format!("{what} hex: {e}")))
}

fn decode_pattern(
    key: &str,
    size: usize,
    hexbytes: &str,
    hexmask: &str,
) -> ZignResult<Option<BytePattern>> {
    let expected = size
        .checked_mul(2)
        .ok_or_else(|| ZignError::format(key, format!("pattern size {size} is out of range")))?;
    for (what, text) in [("pattern", hexbytes), ("mask", hexmask)] {
        if text.len() != expected {
            return Err(ZignError::format(
                key,
                format!("{what} hex length {} does not match size {size}", text.len()),
            ));
        }
    }
    if size == 0 {
        return Ok(None);
    }
    let bytes = decode_hex(key, "pattern", hexbytes)?;
    let mask = decode_hex(key, "mask", hexmask)?;
    BytePattern::new(bytes, mask).map(Some).map_err(|e| ZignError::format(key, e.to_string()))
}

fn decode_graph(key: &str, hexgraph: &str) -> ZignResult<Option<GraphMetrics>> {
    if hexgraph.is_empty() {
        return Ok(None);
    }
    let raw = decode_hex(key, "graph", hexgraph)?;
    GraphMetrics::from_bytes(&raw)
        .map(Some)
        .ok_or_else(|| ZignError::format(key, format!("graph record has {} bytes", raw.len())))
}

fn decode_addr(key: &str, text: &str) -> ZignResult<Option<u64>> {
    if text == ADDR_UNSET {
        return Ok(None);
    }
    match text.parse::<u64>() {
        Ok(u64::MAX) => Ok(None),
        Ok(addr) => Ok(Some(addr)),
        Err(_) => Err(ZignError::format(key, format!("invalid address `{text}`"))),
    }
}

fn decode_hash(key: &str, text: &str) -> ZignResult<Option<String>> {
    if text.is_empty() {
        return Ok(None);
    }
    decode_hex(key, "hash", text)?;
    Ok(Some(text.to_string()))
}

fn decode_list<T, F>(text: &str, parse: F, key: &str) -> ZignResult<Option<Vec<T>>>
where
    F: Fn(&str) -> ZignResult<T>,
{
    if text.is_empty() {
        return Ok(None);
    }
    text.split(',')
        .map(|token| {
            if token.is_empty() {
                return Err(ZignError::format(key, "empty list element"));
            }
            parse(token).map_err(|e| ZignError::format(key, e.to_string()))
        })
        .collect::<ZignResult<Vec<T>>>()
        .map(Some)
}
