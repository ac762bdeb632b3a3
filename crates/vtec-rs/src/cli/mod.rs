//! CLI surface for vtec-rs.
//!
//! Thin handlers over the core engine: script runs, VTEC/UGC codecs, and
//! active-table maintenance.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::Result;
use crate::config::Config;
use crate::core::DEFAULT_HEADER_WIDTH;

mod commands;
mod render;

// =============================================================================
// Entry + global options
// =============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "vtec",
    version,
    about = "VTEC event tracking: classify hazards against an active table",
    infer_subcommands = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Machine-readable JSON output.
    #[arg(long, global = true)]
    pub json: bool,

    /// Site config file (default: ./vtec.toml when present).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// More log output (repeat for more).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a test-drive script and print each step's product.
    Run(RunArgs),

    /// Decode a VTEC line.
    Parse {
        /// e.g. /O.NEW.KTBW.WS.A.0001.100101T0510Z-100103T0500Z/
        line: String,
    },

    /// Compress zone ids into a UGC header, or decode one.
    Ugc(UgcArgs),

    /// Inspect or purge a JSON-lines active table.
    Table {
        #[command(subcommand)]
        cmd: TableCmd,
    },

    /// Show or initialise configuration.
    Config {
        #[command(subcommand)]
        cmd: ConfigCmd,
    },
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Script file (`.toml` or JSON).
    pub script: PathBuf,

    /// Run against this JSON-lines table instead of a fresh in-memory one.
    #[arg(long, value_name = "PATH", conflicts_with = "persist")]
    pub table: Option<PathBuf>,

    /// Run against the configured active table.
    #[arg(long)]
    pub persist: bool,

    /// Print products without checking step expectations.
    #[arg(long)]
    pub no_check: bool,
}

#[derive(Args, Debug)]
pub struct UgcArgs {
    /// Zone ids to compress, or header text with `--decode`.
    #[arg(required = true)]
    pub zones: Vec<String>,

    /// Parse a header back into zone ids.
    #[arg(long)]
    pub decode: bool,

    /// Wrap width for encoded headers.
    #[arg(long, default_value_t = DEFAULT_HEADER_WIDTH)]
    pub width: usize,
}

#[derive(Args, Debug)]
pub struct TableArgs {
    /// Table file (default: configured path).
    #[arg(long, value_name = "PATH")]
    pub table: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum TableCmd {
    /// List stored records.
    Show(TableArgs),

    /// Drop timelines that ended more than the purge window before a time.
    Purge {
        #[command(flatten)]
        table: TableArgs,

        /// RFC 3339 instant (default: now).
        #[arg(long, value_name = "TIME")]
        before: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCmd {
    /// Print the merged configuration.
    Show,

    /// Write a default user config file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

pub(crate) struct Ctx {
    pub config: Config,
    pub json: bool,
}

pub fn parse_from<I, T>(args: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::parse_from(args)
}

/// Run the CLI (used by bin).
pub fn run(cli: Cli, config: Config) -> Result<()> {
    let ctx = Ctx {
        config,
        json: cli.json,
    };
    match cli.command {
        Commands::Run(args) => commands::run_script(&ctx, &args),
        Commands::Parse { line } => commands::parse_line(&line),
        Commands::Ugc(args) => commands::ugc(&ctx, &args),
        Commands::Table { cmd } => match cmd {
            TableCmd::Show(args) => commands::table_show(&ctx, &args),
            TableCmd::Purge { table, before } => {
                commands::table_purge(&ctx, &table, before.as_deref())
            }
        },
        Commands::Config { cmd } => match cmd {
            ConfigCmd::Show => commands::config_show(&ctx),
            ConfigCmd::Init { force } => commands::config_init(force),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_accepts_global_flags_after_subcommand() {
        let cli = parse_from(["vtec", "run", "s1.toml", "--json", "-vv", "--no-check"]);
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.script, PathBuf::from("s1.toml"));
                assert!(args.no_check);
                assert!(args.table.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn table_purge_parses_before() {
        let cli = parse_from([
            "vtec",
            "table",
            "purge",
            "--table",
            "t.jsonl",
            "--before",
            "2010-01-02T00:00:00Z",
        ]);
        let Commands::Table {
            cmd: TableCmd::Purge { table, before },
        } = cli.command
        else {
            panic!("expected table purge");
        };
        assert_eq!(table.table, Some(PathBuf::from("t.jsonl")));
        assert_eq!(before.as_deref(), Some("2010-01-02T00:00:00Z"));
    }
}
