use anyhow::{Context, Result};

use crate::Session;

/// List known spaces with their member counts; `*` marks the selection.
pub fn spaces_command(session: &Session, json: bool) -> Result<()> {
    let spaces = session.engine.spaces();
    if json {
        let serialized =
            serde_json::to_string_pretty(&spaces).context("Failed to serialize spaces to JSON")?;
        println!("{serialized}");
        return Ok(());
    }

    println!("Spaces ({}):", spaces.len());
    if spaces.is_empty() {
        println!("  (none)");
        return Ok(());
    }
    for space in spaces {
        let marker = if space.selected { '*' } else { ' ' };
        println!("{marker} {} ({})", space.name, space.count);
    }
    Ok(())
}

pub fn rename_space_command(session: &mut Session, old: &str, new: &str) -> Result<()> {
    let moved = session
        .engine
        .rename_space(old, new)
        .with_context(|| format!("Failed to rename space '{old}' to '{new}'"))?;
    session.persist()?;
    println!("Renamed space '{old}' to '{new}' ({moved} signature(s))");
    Ok(())
}

/// Move a space's signatures to the global space and forget the space.
pub fn unset_space_command(session: &mut Session, space: &str) -> Result<()> {
    let moved = session
        .engine
        .unset_space(space)
        .with_context(|| format!("Failed to unset space '{space}'"))?;
    session.persist()?;
    println!("Unset space '{space}' ({moved} signature(s) moved to *)");
    Ok(())
}
