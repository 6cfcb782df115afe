use anyhow::{Context, Result};
use zign_core::model::{BytePattern, GraphMetrics, Variable};
use zign_core::services::ListFormat;

use crate::{parse_address, Session};

/// Print every signature visible in the selected space.
pub fn list_command(session: &Session, format: ListFormat) -> Result<()> {
    let rendered = session.engine.list(format).context("Failed to render signatures")?;
    if format == ListFormat::Json {
        println!("{rendered}");
    } else {
        print!("{rendered}");
    }
    Ok(())
}

/// Add a byte pattern written in masked hex (`.` marks a wildcard nibble).
pub fn add_bytes_command(session: &mut Session, name: &str, masked_hex: &str) -> Result<()> {
    let pattern = BytePattern::from_masked_hex(masked_hex)
        .with_context(|| format!("Invalid byte pattern '{masked_hex}'"))?;
    session
        .engine
        .add_pattern(name, pattern)
        .with_context(|| format!("Failed to add bytes to '{name}'"))?;
    session.persist()
}

pub fn add_address_command(session: &mut Session, name: &str, addr: &str) -> Result<()> {
    let addr = parse_address(addr)?;
    session
        .engine
        .add_address(name, addr)
        .with_context(|| format!("Failed to add address to '{name}'"))?;
    session.persist()
}

pub fn add_hash_command(session: &mut Session, name: &str, digest: &str) -> Result<()> {
    session
        .engine
        .add_hash(name, digest)
        .with_context(|| format!("Failed to add hash to '{name}'"))?;
    session.persist()
}

pub fn add_refs_command(session: &mut Session, name: &str, refs: Vec<String>) -> Result<()> {
    session
        .engine
        .add_refs(name, refs)
        .with_context(|| format!("Failed to add refs to '{name}'"))?;
    session.persist()
}

pub fn add_vars_command(session: &mut Session, name: &str, vars: Vec<Variable>) -> Result<()> {
    session
        .engine
        .add_vars(name, vars)
        .with_context(|| format!("Failed to add vars to '{name}'"))?;
    session.persist()
}

pub fn add_graph_command(session: &mut Session, name: &str, metrics: GraphMetrics) -> Result<()> {
    session
        .engine
        .add_graph(name, metrics)
        .with_context(|| format!("Failed to add graph to '{name}'"))?;
    session.persist()
}

/// Delete one signature, or everything in scope with `*`.
pub fn delete_command(session: &mut Session, name: &str) -> Result<()> {
    let removed =
        session.engine.delete(name).with_context(|| format!("Failed to delete '{name}'"))?;
    session.persist()?;
    println!("Deleted {removed} signature(s)");
    Ok(())
}
