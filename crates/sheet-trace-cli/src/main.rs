//! sheet-trace CLI - column dependency tracing tool

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sheet_trace::prelude::*;
use sheet_trace::DEFAULT_MAX_DEPTH;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sheet-trace")]
#[command(
    author,
    version,
    about = "Trace which columns a spreadsheet column is computed from"
)]
struct Cli {
    /// Show debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the dependency tree of one column
    Tree {
        /// Workbook (xlsx, xlsm, csv, or a directory of csv files)
        input: PathBuf,

        /// Sheet holding the starting column
        #[arg(short, long)]
        sheet: String,

        /// Starting column letter
        #[arg(short, long, conflicts_with = "header", required_unless_present = "header")]
        column: Option<String>,

        /// Starting column header text
        #[arg(long)]
        header: Option<String>,

        #[command(flatten)]
        rows: RowArgs,

        /// Deepest formula level to expand
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,

        /// Which lookup values count as dependencies
        #[arg(long, value_enum, default_value_t = LookupRows::Any)]
        lookup_rows: LookupRows,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List all sheets in a workbook
    Sheets {
        /// Workbook file or csv directory
        input: PathBuf,
    },

    /// List each column's header and formula-row content
    Columns {
        /// Workbook file or csv directory
        input: PathBuf,

        /// Sheet to list
        #[arg(short, long)]
        sheet: String,

        #[command(flatten)]
        rows: RowArgs,
    },
}

#[derive(clap::Args, Clone, Copy)]
struct RowArgs {
    /// 1-based row holding the column headers
    #[arg(long, default_value_t = 1)]
    header_row: u32,

    /// 1-based row holding the representative formulas
    #[arg(long, default_value_t = 2)]
    formula_row: u32,
}

impl RowArgs {
    fn config(self) -> Result<RowConfig> {
        RowConfig::new(self.header_row, self.formula_row).context("Invalid row settings")
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum LookupRows {
    /// Track lookup values on any row
    Any,
    /// Track lookup values only on the formula row
    FormulaRow,
}

impl From<LookupRows> for LookupValueRows {
    fn from(rows: LookupRows) -> Self {
        match rows {
            LookupRows::Any => LookupValueRows::AnyRow,
            LookupRows::FormulaRow => LookupValueRows::FormulaRowOnly,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, ValueEnum)]
enum OutputFormat {
    /// Indented text tree
    Text,
    /// Collapsible HTML page
    Html,
    /// JSON document
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Tree {
            input,
            sheet,
            column,
            header,
            rows,
            max_depth,
            lookup_rows,
            format,
            output,
        } => {
            let selector = selector(column, header)?;
            let options = TraceOptions {
                rows: rows.config()?,
                max_depth,
                lookup_value_rows: lookup_rows.into(),
            };
            let workbook = open(&input)?;
            let rendered = trace(&workbook, &sheet, selector, options, format)?;
            emit(&rendered, output.as_deref())
        }
        Commands::Sheets { input } => {
            let workbook = open(&input)?;
            emit(&list_sheets(&workbook), None)
        }
        Commands::Columns { input, sheet, rows } => {
            let workbook = open(&input)?;
            emit(&list_columns(&workbook, &sheet, rows.config()?)?, None)
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .init();
}

fn open(input: &Path) -> Result<Workbook> {
    let workbook =
        Workbook::open(input).with_context(|| format!("Failed to open '{}'", input.display()))?;
    info!(path = %input.display(), sheets = workbook.sheet_count(), "opened workbook");
    Ok(workbook)
}

fn selector(column: Option<String>, header: Option<String>) -> Result<ColumnSelector> {
    match (column, header) {
        (Some(letters), None) => {
            let column = ColumnId::parse(letters.trim())
                .with_context(|| format!("Invalid column '{}'", letters))?;
            Ok(ColumnSelector::Letter(column))
        }
        (None, Some(header)) => Ok(ColumnSelector::Header(header)),
        _ => bail!("Give exactly one of --column or --header"),
    }
}

fn trace(
    workbook: &Workbook,
    sheet: &str,
    selector: ColumnSelector,
    options: TraceOptions,
    format: OutputFormat,
) -> Result<String> {
    let resolver = ColumnResolver::new(workbook);
    let tree = TreeBuilder::new(&resolver, options)
        .build(sheet, selector)
        .with_context(|| format!("Failed to trace sheet '{}'", sheet))?;

    info!(nodes = tree.count(), depth = tree.depth(), "built dependency tree");

    Ok(match format {
        OutputFormat::Text => render_text(&tree),
        OutputFormat::Html => {
            let title = format!("{} / {} ({})", tree.sheet, tree.header(), tree.column);
            render_html(&tree, &title)
        }
        OutputFormat::Json => {
            let mut json = render_json(&tree)?;
            json.push('\n');
            json
        }
    })
}

fn list_sheets(workbook: &Workbook) -> String {
    workbook
        .sheet_names()
        .iter()
        .enumerate()
        .map(|(i, name)| format!("{}\t{}\n", i, name))
        .collect()
}

fn list_columns(workbook: &Workbook, sheet: &str, rows: RowConfig) -> Result<String> {
    let resolver = ColumnResolver::new(workbook);
    let columns = resolver
        .sheet_columns(sheet, rows)
        .with_context(|| format!("Failed to read sheet '{}'", sheet))?;

    let mut out = String::new();
    for (column, info) in columns.iter() {
        let content = match &info.content {
            ColumnContent::Formula(formula) => formula.clone(),
            ColumnContent::StaticValue(value) => value.to_string(),
            ColumnContent::Empty => String::new(),
        };
        out.push_str(&format!("{}\t{}\t{}\n", column, info.header, content));
    }
    Ok(out)
}

fn emit(text: &str, output: Option<&Path>) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        eprintln!("Wrote '{}'", path.display());
    } else {
        io::stdout()
            .write_all(text.as_bytes())
            .context("Failed to write to stdout")?;
    }
    Ok(())
}
