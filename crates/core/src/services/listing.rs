//! Field-by-field listing of signatures.
//!
//! [`emit`] walks one item and reports each sub-record to a [`ListSink`],
//! absent ones included. The sinks here render the three listing formats.

use serde_json::{json, Map, Value};

use crate::model::{BytePattern, GraphMetrics, SignatureItem, Variable, GLOBAL_SPACE};

/// Output format of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListFormat {
    /// Human-readable, one indented line per criterion.
    #[default]
    Text,
    /// A JSON array of objects.
    Json,
    /// `zs` / `za` commands that recreate the signatures.
    Commands,
}

/// Receiver for one item's fields, in a fixed order.
pub trait ListSink {
    fn begin_item(&mut self, item: &SignatureItem);
    fn bytes(&mut self, pattern: Option<&BytePattern>);
    fn graph(&mut self, graph: Option<&GraphMetrics>);
    fn address(&mut self, addr: Option<u64>);
    fn refs(&mut self, refs: Option<&[String]>);
    fn vars(&mut self, vars: Option<&[Variable]>);
    fn hash(&mut self, digest: Option<&str>);
    fn end_item(&mut self, item: &SignatureItem);
}

/// Report every field of `item` to `sink`.
pub fn emit(item: &SignatureItem, sink: &mut dyn ListSink) {
    sink.begin_item(item);
    sink.bytes(item.bytes.as_ref());
    sink.graph(item.graph.as_ref());
    sink.address(item.addr);
    sink.refs(item.refs.as_deref());
    sink.vars(item.vars.as_deref());
    sink.hash(item.hash.as_deref());
    sink.end_item(item);
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

fn join_vars(vars: &[Variable], sep: &str) -> String {
    vars.iter().map(Variable::to_string).collect::<Vec<_>>().join(sep)
}

/// Indented human-readable listing.
#[derive(Debug, Default)]
pub struct TextSink {
    out: String,
    /// Prefix names with their space, for listings spanning several spaces.
    show_space: bool,
}

impl TextSink {
    pub fn new(show_space: bool) -> Self {
        Self { out: String::new(), show_space }
    }

    pub fn finish(self) -> String {
        self.out
    }
}

impl ListSink for TextSink {
    fn begin_item(&mut self, item: &SignatureItem) {
        let header = match (&item.space, self.show_space) {
            (Some(space), true) => format!("({space}) {}:", item.name),
            _ => format!("{}:", item.name),
        };
        push_line(&mut self.out, &header);
    }

    fn bytes(&mut self, pattern: Option<&BytePattern>) {
        if let Some(p) = pattern {
            push_line(&mut self.out, &format!("  bytes: {}", p.to_masked_hex()));
        }
    }

    fn graph(&mut self, graph: Option<&GraphMetrics>) {
        if let Some(g) = graph {
            push_line(
                &mut self.out,
                &format!(
                    "  graph: cc={} nbbs={} edges={} ebbs={} bbsum={}",
                    g.cc, g.nbbs, g.edges, g.ebbs, g.bbsum
                ),
            );
        }
    }

    fn address(&mut self, addr: Option<u64>) {
        if let Some(addr) = addr {
            push_line(&mut self.out, &format!("  addr: 0x{addr:08x}"));
        }
    }

    fn refs(&mut self, refs: Option<&[String]>) {
        if let Some(refs) = refs {
            push_line(&mut self.out, &format!("  refs: {}", refs.join(", ")));
        }
    }

    fn vars(&mut self, vars: Option<&[Variable]>) {
        if let Some(vars) = vars {
            push_line(&mut self.out, &format!("  vars: {}", join_vars(vars, ", ")));
        }
    }

    fn hash(&mut self, digest: Option<&str>) {
        if let Some(digest) = digest {
            push_line(&mut self.out, &format!("  bbhash: {digest}"));
        }
    }

    fn end_item(&mut self, _item: &SignatureItem) {}
}

/// JSON array listing; absent fields are rendered as empty values.
#[derive(Debug, Default)]
pub struct JsonSink {
    items: Vec<Value>,
    current: Map<String, Value>,
}

impl JsonSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_value(self) -> Value {
        Value::Array(self.items)
    }

    pub fn finish(self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.into_value())
    }

    fn field(&mut self, name: &str, value: Value) {
        self.current.insert(name.to_string(), value);
    }
}

impl ListSink for JsonSink {
    fn begin_item(&mut self, item: &SignatureItem) {
        self.current = Map::new();
        if let Some(space) = &item.space {
            self.field("zignspace", json!(space));
        }
        self.field("name", json!(item.name));
    }

    fn bytes(&mut self, pattern: Option<&BytePattern>) {
        let text = pattern.map(BytePattern::to_masked_hex).unwrap_or_default();
        self.field("bytes", json!(text));
    }

    fn graph(&mut self, graph: Option<&GraphMetrics>) {
        let value = match graph {
            Some(g) => json!({
                "cc": g.cc, "nbbs": g.nbbs, "edges": g.edges, "ebbs": g.ebbs, "bbsum": g.bbsum
            }),
            None => json!({}),
        };
        self.field("graph", value);
    }

    fn address(&mut self, addr: Option<u64>) {
        let value = addr.map_or(json!(-1), |a| json!(a));
        self.field("addr", value);
    }

    fn refs(&mut self, refs: Option<&[String]>) {
        self.field("refs", json!(refs.unwrap_or_default()));
    }

    fn vars(&mut self, vars: Option<&[Variable]>) {
        let tokens: Vec<String> = vars.unwrap_or_default().iter().map(Variable::to_string).collect();
        self.field("vars", json!(tokens));
    }

    fn hash(&mut self, digest: Option<&str>) {
        let value = digest.map_or(json!({}), |d| json!({ "bbhash": d }));
        self.field("hash", value);
    }

    fn end_item(&mut self, _item: &SignatureItem) {
        let object = std::mem::take(&mut self.current);
        self.items.push(Value::Object(object));
    }
}

/// Command form: `zs <space>` followed by one `za <name> <kind> ...` per criterion.
#[derive(Debug, Default)]
pub struct CommandSink {
    out: String,
    name: String,
}

impl CommandSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn finish(self) -> String {
        self.out
    }
}

impl ListSink for CommandSink {
    fn begin_item(&mut self, item: &SignatureItem) {
        let space = item.space.as_deref().unwrap_or(GLOBAL_SPACE);
        push_line(&mut self.out, &format!("zs {space}"));
        self.name = item.name.clone();
    }

    fn bytes(&mut self, pattern: Option<&BytePattern>) {
        if let Some(p) = pattern {
            push_line(&mut self.out, &format!("za {} b {}", self.name, p.to_masked_hex()));
        }
    }

    fn graph(&mut self, graph: Option<&GraphMetrics>) {
        if let Some(g) = graph {
            push_line(
                &mut self.out,
                &format!(
                    "za {} g cc={} nbbs={} edges={} ebbs={} bbsum={}",
                    self.name, g.cc, g.nbbs, g.edges, g.ebbs, g.bbsum
                ),
            );
        }
    }

    fn address(&mut self, addr: Option<u64>) {
        if let Some(addr) = addr {
            push_line(&mut self.out, &format!("za {} o 0x{addr:08x}", self.name));
        }
    }

    fn refs(&mut self, refs: Option<&[String]>) {
        if let Some(refs) = refs {
            push_line(&mut self.out, &format!("za {} r {}", self.name, refs.join(" ")));
        }
    }

    fn vars(&mut self, vars: Option<&[Variable]>) {
        if let Some(vars) = vars {
            push_line(&mut self.out, &format!("za {} v {}", self.name, join_vars(vars, " ")));
        }
    }

    fn hash(&mut self, digest: Option<&str>) {
        if let Some(digest) = digest {
            push_line(&mut self.out, &format!("za {} h {digest}", self.name));
        }
    }

    fn end_item(&mut self, _item: &SignatureItem) {}
}
