use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;
use zign_cli::commands::{
    add_address_command, add_bytes_command, add_graph_command, add_hash_command, add_refs_command,
    add_vars_command, delete_command, export_command, list_command, merge_command,
    rename_space_command, scan_command, spaces_command, unset_space_command, DEFAULT_SCAN_CHUNK,
};
use zign_cli::{parse_address, Session};
use zign_core::model::{GraphMetrics, Variable};
use zign_core::services::ListFormat;

/// Function signature ("zignature") manager.
///
/// This CLI is a thin wrapper around `zign-core`. It operates on a single
/// signature file, which is created on the first mutation and rewritten after
/// every mutation.
#[derive(Parser, Debug)]
#[command(name = "zign", version, about = "Function signature manager", long_about = None)]
struct Cli {
    /// Log debug details to stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    /// Signature file to operate on.
    #[arg(long, global = true, default_value = "signatures.zign")]
    db: PathBuf,

    /// Optional JSON config (search paths, search/graph thresholds, default space).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Space to select before running the command.
    #[arg(long, global = true)]
    space: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Text,
    Json,
    Commands,
}

impl From<FormatArg> for ListFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => ListFormat::Text,
            FormatArg::Json => ListFormat::Json,
            FormatArg::Commands => ListFormat::Commands,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List signatures in the selected space (all spaces when none is selected).
    List {
        #[arg(long, value_enum, default_value = "text")]
        format: FormatArg,
    },

    /// Add a byte pattern, e.g. `55..89e5` (`.` is a wildcard nibble).
    AddBytes { name: String, pattern: String },

    /// Add a function entry address (hex with 0x, or decimal).
    AddAddress { name: String, addr: String },

    /// Add a basic-block SHA-256 digest.
    AddHash { name: String, digest: String },

    /// Add the ordered list of referenced symbols.
    AddRefs {
        name: String,
        #[arg(required = true)]
        refs: Vec<String>,
    },

    /// Add the ordered list of variables, e.g. `b-8 s16 r0`.
    AddVars {
        name: String,
        #[arg(required = true, allow_hyphen_values = true)]
        vars: Vec<Variable>,
    },

    /// Add control-flow graph metrics; -1 means "don't care".
    AddGraph {
        name: String,
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        cc: i32,
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        nbbs: i32,
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        edges: i32,
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        ebbs: i32,
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        bbsum: i32,
    },

    /// Delete a signature from the selected space, or `*` for all in scope.
    Delete { name: String },

    /// List known spaces with their signature counts.
    Spaces {
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Rename a space, moving all of its signatures.
    RenameSpace { old: String, new: String },

    /// Move a space's signatures to the global space and forget the space.
    UnsetSpace { name: String },

    /// Merge other signature files into the db.
    Merge {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Files are gzip-compressed.
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },

    /// Write the db's signatures to another file.
    Export {
        file: PathBuf,
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },

    /// Scan a raw binary for byte-pattern signatures.
    Scan {
        binary: PathBuf,
        /// Address the first byte of the file is mapped at.
        #[arg(long, default_value = "0")]
        base: String,
        /// Minimum pattern length (defaults to the configured value).
        #[arg(long)]
        min_size: Option<usize>,
        /// Bytes fed to the engine per update.
        #[arg(long, default_value_t = DEFAULT_SCAN_CHUNK)]
        chunk: usize,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt().with_max_level(level).with_writer(std::io::stderr).init();

    let mut session = Session::open(&cli.db, cli.config.as_deref(), cli.space.as_deref())?;

    match cli.command {
        Command::List { format } => list_command(&session, format.into())?,
        Command::AddBytes { name, pattern } => add_bytes_command(&mut session, &name, &pattern)?,
        Command::AddAddress { name, addr } => add_address_command(&mut session, &name, &addr)?,
        Command::AddHash { name, digest } => add_hash_command(&mut session, &name, &digest)?,
        Command::AddRefs { name, refs } => add_refs_command(&mut session, &name, refs)?,
        Command::AddVars { name, vars } => add_vars_command(&mut session, &name, vars)?,
        Command::AddGraph { name, cc, nbbs, edges, ebbs, bbsum } => {
            let metrics = GraphMetrics::new(cc, nbbs, edges, ebbs, bbsum);
            add_graph_command(&mut session, &name, metrics)?
        }
        Command::Delete { name } => delete_command(&mut session, &name)?,
        Command::Spaces { json } => spaces_command(&session, json)?,
        Command::RenameSpace { old, new } => rename_space_command(&mut session, &old, &new)?,
        Command::UnsetSpace { name } => unset_space_command(&mut session, &name)?,
        Command::Merge { files, gzip } => merge_command(&mut session, &files, gzip)?,
        Command::Export { file, gzip } => export_command(&session, &file, gzip)?,
        Command::Scan { binary, base, min_size, chunk, json } => {
            let base = parse_address(&base)?;
            scan_command(&session, &binary, base, min_size, chunk, json)?
        }
    }

    Ok(())
}
