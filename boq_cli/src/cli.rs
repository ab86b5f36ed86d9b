//! CLI argument definitions for `boq`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "boq",
    version,
    about = "Bill-of-quantities ledger - edit, price and export estimates",
    long_about = "Edit construction cost estimates stored as .boq files.\n\n\
                  Items are addressed by id, by GROUP/CODE for grouped items,\n\
                  or by CODE for loose items. Groups are addressed by id or code."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Explicit log level (overrides -v).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    #[arg(long = "log-format", value_enum, default_value = "pretty", global = true)]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new, empty estimate file.
    New(NewArgs),

    /// Append a division (grouping).
    AddGroup(AddGroupArgs),

    /// Append a line item or section header.
    AddItem(AddItemArgs),

    /// Append a line item priced from the cost catalog.
    Pick(PickArgs),

    /// Set one field of a line item.
    Set(SetArgs),

    /// Delete a line item.
    Delete(ItemRefArgs),

    /// Delete a division and all its items.
    DeleteGroup(GroupRefArgs),

    /// Collapse or expand a division.
    Toggle(GroupRefArgs),

    /// Change title, client, currency, markup, site multiplier or tax.
    Settings(SettingsArgs),

    /// Print the priced estimate.
    Show(ShowArgs),

    /// Export the estimate as CSV.
    Export(ExportArgs),

    /// Search the cost catalog.
    Catalog(CatalogArgs),

    /// List known units of measure.
    Units(MasterArgs),

    /// List the division taxonomy.
    Divisions(MasterArgs),

    /// Copy an estimate into a project store directory.
    Archive(ArchiveArgs),

    /// Summarize every estimate in a project store directory.
    Quotes(QuotesArgs),
}

#[derive(Args)]
pub struct FileArg {
    /// Estimate file (.boq).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Args)]
pub struct NewArgs {
    #[command(flatten)]
    pub project: FileArg,

    #[arg(long, default_value = "")]
    pub title: String,

    #[arg(long, default_value = "")]
    pub client: String,

    /// Currency symbol for on-screen totals.
    #[arg(long)]
    pub currency: Option<String>,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct AddGroupArgs {
    #[command(flatten)]
    pub project: FileArg,

    /// Division name (ignored with --division).
    #[arg(value_name = "NAME", required_unless_present = "division")]
    pub name: Option<String>,

    /// Add a division from the taxonomy by its code, keeping that code.
    #[arg(long, value_name = "CODE")]
    pub division: Option<String>,

    /// Master data JSON to use instead of the built-in taxonomy.
    #[arg(long, value_name = "PATH")]
    pub master: Option<PathBuf>,
}

#[derive(Args)]
pub struct AddItemArgs {
    #[command(flatten)]
    pub project: FileArg,

    /// Division to add into (loose list when omitted).
    #[arg(long, short)]
    pub group: Option<String>,

    /// `item` for a priced item or `section` for a section header.
    #[arg(long, value_name = "KIND", default_value = "item")]
    pub kind: String,

    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args)]
pub struct PickArgs {
    #[command(flatten)]
    pub project: FileArg,

    /// Catalog entry id.
    #[arg(value_name = "ENTRY")]
    pub entry: String,

    #[arg(long, short)]
    pub group: Option<String>,

    /// Catalog JSON to use instead of the built-in catalog.
    #[arg(long, value_name = "PATH")]
    pub catalog: Option<PathBuf>,
}

#[derive(Args)]
pub struct SetArgs {
    #[command(flatten)]
    pub project: FileArg,

    #[arg(value_name = "ITEM")]
    pub item: String,

    /// code, description, unit, division, qty, material, labor, plant or waste.
    #[arg(value_name = "FIELD")]
    pub field: String,

    #[arg(value_name = "VALUE", allow_hyphen_values = true)]
    pub value: String,
}

#[derive(Args)]
pub struct ItemRefArgs {
    #[command(flatten)]
    pub project: FileArg,

    #[arg(value_name = "ITEM")]
    pub item: String,
}

#[derive(Args)]
pub struct GroupRefArgs {
    #[command(flatten)]
    pub project: FileArg,

    #[arg(value_name = "GROUP")]
    pub group: String,
}

#[derive(Args)]
pub struct SettingsArgs {
    #[command(flatten)]
    pub project: FileArg,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub client: Option<String>,

    #[arg(long)]
    pub currency: Option<String>,

    /// Markup percent (switches to markup pricing).
    #[arg(long, conflicts_with = "multiplier", allow_hyphen_values = true)]
    pub markup: Option<String>,

    /// Site multiplier factor (switches to multiplier pricing).
    #[arg(long, allow_hyphen_values = true)]
    pub multiplier: Option<String>,

    /// Label shown on the multiplier adjustment row.
    #[arg(long)]
    pub label: Option<String>,

    /// Flat tax percent on the grand total.
    #[arg(long, allow_hyphen_values = true)]
    pub tax: Option<String>,

    /// Mark the quote as draft or sent.
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,
}

#[derive(Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub project: FileArg,

    /// Print the priced project as JSON instead of a table.
    #[arg(long)]
    pub json: bool,

    /// Master data JSON used to name loose-item divisions.
    #[arg(long, value_name = "PATH")]
    pub master: Option<PathBuf>,
}

#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub project: FileArg,

    /// `grouped` (division schedule) or `flat` (quote list).
    #[arg(long, value_name = "LAYOUT", default_value = "grouped")]
    pub layout: String,

    /// Hide a priced column (repeatable).
    #[arg(long, value_name = "COLUMN")]
    pub hide: Vec<String>,

    /// Show a priced column hidden by the layout preset (repeatable).
    #[arg(long, value_name = "COLUMN")]
    pub show: Vec<String>,

    /// Relabel a column, e.g. --rename labor=LABOUR (repeatable).
    #[arg(long, value_name = "COLUMN=LABEL")]
    pub rename: Vec<String>,

    /// Directory to write `<title>.csv` into (default: current directory).
    #[arg(long, value_name = "DIR", conflicts_with = "stdout")]
    pub out: Option<PathBuf>,

    /// Write CSV to stdout instead of a file.
    #[arg(long)]
    pub stdout: bool,
}

#[derive(Args)]
pub struct CatalogArgs {
    /// Case-insensitive match on name or category (all entries when omitted).
    #[arg(value_name = "QUERY")]
    pub query: Option<String>,

    #[arg(long, value_name = "PATH")]
    pub catalog: Option<PathBuf>,

    /// Show only the first N entries.
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct MasterArgs {
    /// Master data JSON to use instead of the built-in lists.
    #[arg(long, value_name = "PATH")]
    pub master: Option<PathBuf>,
}

#[derive(Args)]
pub struct ArchiveArgs {
    #[command(flatten)]
    pub project: FileArg,

    /// Store directory (one `<id>.boq` per project).
    #[arg(value_name = "STORE")]
    pub store: PathBuf,
}

#[derive(Args)]
pub struct QuotesArgs {
    #[arg(value_name = "STORE")]
    pub store: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Draft,
    Sent,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_set_with_negative_value() {
        let cli = Cli::parse_from(["boq", "set", "est.boq", "03/01", "qty", "-5"]);
        match cli.command {
            Command::Set(args) => {
                assert_eq!(args.item, "03/01");
                assert_eq!(args.field, "qty");
                assert_eq!(args.value, "-5");
            }
            _ => panic!("expected set"),
        }
    }

    #[test]
    fn test_parse_export_flags() {
        let cli = Cli::parse_from([
            "boq", "-vv", "export", "est.boq", "--layout", "flat", "--hide", "labor", "--rename", "amount=TOTAL",
            "--stdout",
        ]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Export(args) => {
                assert_eq!(args.layout, "flat");
                assert_eq!(args.hide, vec!["labor"]);
                assert_eq!(args.rename, vec!["amount=TOTAL"]);
                assert!(args.stdout);
            }
            _ => panic!("expected export"),
        }
    }

    #[test]
    fn test_parse_settings_status_and_item_kind() {
        let cli = Cli::parse_from(["boq", "settings", "est.boq", "--status", "sent"]);
        match cli.command {
            Command::Settings(args) => assert!(matches!(args.status, Some(StatusArg::Sent))),
            _ => panic!("expected settings"),
        }
        let cli = Cli::parse_from(["boq", "add-item", "est.boq", "-g", "03", "--kind", "section"]);
        match cli.command {
            Command::AddItem(args) => {
                assert_eq!(args.kind, "section");
                assert_eq!(args.group.as_deref(), Some("03"));
            }
            _ => panic!("expected add-item"),
        }
    }
}
