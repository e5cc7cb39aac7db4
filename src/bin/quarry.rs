//! quarry: compile and run queries from the command line
//!
//! Tables are declared in `quarry.toml`; the query itself is described with
//! flags.
//!
//! # Usage
//!
//! ```bash
//! # Show the SQL for a dialect
//! quarry compile user --join tweet --filter "active = true" --order-by user.id --dialect sqlite
//!
//! # Execute and print nested objects
//! quarry run user --join tweet --order-by user.id --objects
//!
//! # Dialect feature matrix
//! quarry dialects
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use quarry::materialize::Projection;
use quarry::prelude::*;
use quarry::transpiler::{ConcatStyle, Pagination, PlaceholderStyle, UpsertStyle};

#[derive(Parser)]
#[command(name = "quarry")]
#[command(version)]
#[command(about = "Compile composable queries to dialect-correct SQL", long_about = None)]
#[command(after_help = "EXAMPLES:
    quarry compile user --filter 'active = true' --limit 10
    quarry compile user --join tweet --order-by user.id --dialect mysql
    quarry run user --join tweet --order-by user.id --objects")]
struct Cli {
    /// Config file (defaults to ./quarry.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Dialect preset: postgres, mysql, sqlite, sqlserver
    #[arg(short, long, global = true)]
    dialect: Option<String>,

    /// Database connection URL
    #[arg(long, global = true, env = "QUARRY_DATABASE_URL")]
    database_url: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the SQL and parameters without executing
    Compile {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Execute the query and print the result
    Run {
        #[command(flatten)]
        query: QueryArgs,

        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,

        /// Rebuild nested objects along the joins (JSON output)
        #[arg(long)]
        objects: bool,
    },
    /// Show what each dialect preset supports
    Dialects,
}

#[derive(Args)]
struct QueryArgs {
    /// Primary table
    table: String,

    /// Columns to select (`field` or `table.field`); all fields by default
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Tables to INNER JOIN, following declared foreign keys
    #[arg(long, value_delimiter = ',')]
    join: Vec<String>,

    /// Tables to LEFT JOIN, following declared foreign keys
    #[arg(long, value_delimiter = ',')]
    left_join: Vec<String>,

    /// Filter expression, e.g. "active = true and age > 30"
    #[arg(short, long)]
    filter: Option<String>,

    /// Sort keys (`field`, `table.field`, suffix `:desc` to reverse)
    #[arg(long, value_delimiter = ',')]
    order_by: Vec<String>,

    #[arg(long)]
    limit: Option<u64>,

    #[arg(long)]
    offset: Option<u64>,

    #[arg(long)]
    distinct: bool,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "quarry=debug" } else { "quarry=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Dialects = cli.command {
        show_dialects();
        return Ok(());
    }

    let mut config = QuarryConfig::discover(cli.config.as_deref())
        .context("loading configuration")?
        .with_env();
    if let Some(url) = &cli.database_url {
        config.database.url = Some(url.clone());
    }
    if let Some(name) = &cli.dialect {
        config.database.dialect = Some(name.clone());
    }
    let dialect = config.dialect_config()?;
    debug!(dialect = %dialect.name, tables = config.tables.len(), "configuration ready");

    match &cli.command {
        Commands::Compile { query } => {
            let query = build_query(&config, query)?;
            let compiled = query.to_sql_with_dialect(&dialect)?;
            print_compiled(&compiled, cli.verbose);
        }
        Commands::Run {
            query,
            format,
            objects,
        } => {
            let query = build_query(&config, query)?;
            if config.database.url.is_none() {
                bail!("no database URL; use --database-url or set QUARRY_DATABASE_URL");
            }
            let db = Database::from_config(&config.database, dialect).await?;
            if cli.verbose {
                print_compiled(&db.compile(&query)?, true);
            }
            if *objects {
                let objects = db.fetch_objects(&query).await?;
                let json: Vec<serde_json::Value> = objects.iter().map(Object::to_json).collect();
                println!("{}", serde_json::to_string_pretty(&json)?);
            } else if query.returns_rows() {
                let projection = Projection::from_query(&query)?;
                let rows = db.fetch_rows(&query).await?;
                info!(rows = rows.len(), "fetched");
                format_output(&projection, rows, format)?;
            } else {
                let affected = db.run(&query).await?;
                println!("{} {} rows affected", "✓".green(), affected);
            }
        }
        Commands::Dialects => {}
    }
    Ok(())
}

/// Turn the flags into a SELECT over declared tables.
fn build_query(config: &QuarryConfig, args: &QueryArgs) -> Result<Query> {
    let primary = config.source(&args.table)?;
    let mut sources = vec![primary.clone()];
    let mut builder = Query::select_from(&primary);

    for name in &args.join {
        let target = config.source(name)?;
        builder = builder.join(&target)?;
        sources.push(target);
    }
    for name in &args.left_join {
        let target = config.source(name)?;
        builder = builder.left_join(&target)?;
        sources.push(target);
    }

    if !args.columns.is_empty() {
        let columns = args
            .columns
            .iter()
            .map(|c| column(&sources, c))
            .collect::<Result<Vec<_>>>()?;
        builder = builder.columns(columns);
    } else if sources.len() > 1 {
        builder = builder.columns(sources.iter().map(Source::star));
    }

    if let Some(filter) = &args.filter {
        builder = builder.filter(parse_filter_in(&sources, filter)?);
    }
    for key in &args.order_by {
        let (name, desc) = match key.rsplit_once(':') {
            Some((name, dir)) if dir.eq_ignore_ascii_case("desc") => (name, true),
            Some((name, dir)) if dir.eq_ignore_ascii_case("asc") => (name, false),
            _ => (key.as_str(), false),
        };
        let expr = column(&sources, name)?;
        builder = builder.order_by(if desc { expr.desc() } else { expr.asc() });
    }
    if let Some(n) = args.limit {
        builder = builder.limit(n);
    }
    if let Some(n) = args.offset {
        builder = builder.offset(n);
    }
    if args.distinct {
        builder = builder.distinct();
    }
    Ok(builder.into())
}

/// `field` of the primary table, or `table.field`.
fn column(sources: &[Source], name: &str) -> Result<Expr> {
    match name.split_once('.') {
        Some((table, field)) => sources
            .iter()
            .find(|s| s.name() == table)
            .map(|s| s.col(field))
            .ok_or_else(|| anyhow!("'{}' is not part of the query", table)),
        None => sources
            .first()
            .map(|s| s.col(name))
            .ok_or_else(|| anyhow!("no primary table")),
    }
}

fn print_compiled(compiled: &CompiledQuery, to_stderr: bool) {
    let mut out = vec![
        "Generated SQL:".green().bold().to_string(),
        compiled.sql.white().to_string(),
    ];
    if !compiled.params.is_empty() {
        out.push(String::new());
        out.push("Parameters:".cyan().to_string());
        for (i, p) in compiled.params.iter().enumerate() {
            out.push(format!("  {} = {}", i + 1, p.to_string().yellow()));
        }
    }
    for line in out {
        if to_stderr {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

fn format_output(projection: &Projection, rows: Vec<Row>, format: &OutputFormat) -> Result<()> {
    if rows.is_empty() {
        println!("{}", "(no results)".dimmed());
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            let records = projection.records(rows)?;
            let json: Vec<serde_json::Value> = records
                .iter()
                .map(|r| {
                    serde_json::Value::Object(
                        r.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
                    )
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Table => {
            let rows = projection.tuples(rows)?;
            let columns = projection.names();

            let mut widths: Vec<usize> = columns.iter().map(|c| c.len()).collect();
            for row in &rows {
                for (w, val) in widths.iter_mut().zip(row) {
                    *w = (*w).max(cell(val).len());
                }
            }

            let header: Vec<String> = columns
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:width$}", c, width = w))
                .collect();
            println!("{}", header.join(" │ ").white().bold());

            let sep: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
            println!("{}", sep.join("─┼─").dimmed());

            for row in &rows {
                let cells: Vec<String> = row
                    .iter()
                    .zip(&widths)
                    .map(|(v, w)| format!("{:width$}", cell(v), width = w))
                    .collect();
                println!("{}", cells.join(" │ "));
            }

            println!();
            println!("{} row(s) returned", rows.len().to_string().cyan());
        }
    }
    Ok(())
}

fn cell(val: &Value) -> String {
    match val {
        Value::String(s) => s.clone(),
        Value::Timestamp(ts) => ts.to_string(),
        Value::Date(d) => d.to_string(),
        other => other.to_string(),
    }
}

fn show_dialects() {
    println!("{}", "Dialect presets".cyan().bold());
    println!();

    let configs: Vec<DialectConfig> = Dialect::ALL.iter().map(Dialect::config).collect();
    let yes_no = |b: bool| if b { "yes" } else { "no" }.to_string();
    let features: Vec<(&str, Box<dyn Fn(&DialectConfig) -> String>)> = vec![
        (
            "quoting",
            Box::new(|c: &DialectConfig| format!("{}name{}", c.quote_open, c.quote_close)),
        ),
        ("placeholder", Box::new(|c: &DialectConfig| placeholder(&c.placeholder))),
        (
            "pagination",
            Box::new(|c: &DialectConfig| match &c.pagination {
                Pagination::LimitOffset { .. } => "LIMIT/OFFSET".to_string(),
                Pagination::OffsetFetch => "OFFSET/FETCH".to_string(),
            }),
        ),
        (
            "booleans",
            Box::new(|c: &DialectConfig| format!("{}/{}", c.true_literal, c.false_literal)),
        ),
        (
            "ilike",
            Box::new(|c: &DialectConfig| {
                c.ilike_operator
                    .clone()
                    .unwrap_or_else(|| "LOWER() LIKE".to_string())
            }),
        ),
        (
            "concat",
            Box::new(|c: &DialectConfig| match &c.concat {
                ConcatStyle::Operator { symbol } => symbol.clone(),
                ConcatStyle::Function { name } => format!("{}()", name),
            }),
        ),
        (
            "upsert",
            Box::new(|c: &DialectConfig| {
                match c.upsert {
                    UpsertStyle::OnConflict => "ON CONFLICT",
                    UpsertStyle::OnDuplicateKey => "ON DUPLICATE KEY",
                    UpsertStyle::Unsupported => "no",
                }
                .to_string()
            }),
        ),
        ("returning", Box::new(move |c: &DialectConfig| yes_no(c.returning))),
        ("row locking", Box::new(move |c: &DialectConfig| yes_no(c.row_locking))),
        ("nulls first/last", Box::new(move |c: &DialectConfig| yes_no(c.nulls_ordering))),
        ("full join", Box::new(move |c: &DialectConfig| yes_no(c.full_join))),
    ];

    print!("{:18}", "".white());
    for c in &configs {
        print!("{:18}", c.name.white().bold());
    }
    println!();
    println!("{}", "─".repeat(18 * (configs.len() + 1)).dimmed());
    for (label, show) in &features {
        print!("{:18}", label.yellow());
        for c in &configs {
            print!("{:18}", show(c));
        }
        println!();
    }
}

fn placeholder(style: &PlaceholderStyle) -> String {
    match style {
        PlaceholderStyle::Qmark => "?".to_string(),
        PlaceholderStyle::Format => "%s".to_string(),
        PlaceholderStyle::Numbered { prefix } => format!("{}1", prefix),
    }
}
