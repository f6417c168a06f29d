//! shadowq — query a database from the command line
//!
//! # Usage
//!
//! ```bash
//! # Show the SQL for a filtered, ordered page
//! shadowq Users --where "Id IN (0, 1)" --order-by UserName:desc --take 10 --dry-run
//!
//! # Count rows of a table-valued function
//! shadowq user_page --function-arg 10 --count --dialect postgres
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{ArgGroup, Parser, ValueEnum};
use colored::*;
use shadowq::config::Config;
use shadowq::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shadowq")]
#[command(version)]
#[command(about = "Composable, parameterized queries from the command line", long_about = None)]
#[command(group(ArgGroup::new("terminal").args(["count", "first", "first_or_default"])))]
#[command(after_help = "EXAMPLES:
    shadowq Users --where \"UserName STARTSWITH 'A'\" --dry-run
    shadowq users --where 'id > 1' --order-by name --take 5 --dialect postgres
    shadowq user_page --function-arg 10 --count --dialect postgres")]
struct Cli {
    /// Table, view or function to query
    source: String,

    /// Call the source as a table-valued function with these arguments
    #[arg(long = "function-arg")]
    function_args: Vec<String>,

    /// Filter expression, e.g. "Id IN (0, 1) AND Email IS NOT NULL" (repeatable)
    #[arg(short = 'w', long = "where")]
    filters: Vec<String>,

    /// Ordering key as `column` or `column:desc` (repeatable, first is primary)
    #[arg(short, long)]
    order_by: Vec<String>,

    /// Rows to skip
    #[arg(long)]
    skip: Option<i64>,

    /// Maximum rows to return
    #[arg(long)]
    take: Option<i64>,

    /// Columns to select
    #[arg(short, long, value_delimiter = ',')]
    select: Vec<String>,

    /// Return the number of matching rows
    #[arg(long)]
    count: bool,

    /// Return exactly one row, failing if there is none
    #[arg(long)]
    first: bool,

    /// Return at most one row
    #[arg(long)]
    first_or_default: bool,

    /// Don't execute, just show the generated SQL
    #[arg(short, long)]
    dry_run: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// SQL dialect to emit (sqlserver, postgres)
    #[arg(long)]
    dialect: Option<Dialect>,

    /// Database connection URL
    #[arg(long, env = "SHADOWQ_DATABASE_URL")]
    database_url: Option<String>,

    /// Configuration file (defaults to ./shadowq.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    init_tracing(&config.log_level);

    let dialect = cli.dialect.unwrap_or(config.dialect);
    let url = cli.database_url.clone().or(config.database_url.clone());

    let driver = SqlxDriver::new(url.clone().unwrap_or_default())
        .with_max_connections(config.max_connections);
    let ctx = DatabaseContext::with_dialect(driver, dialect);
    let query = build_query(&ctx, &cli)?;
    let terminal = terminal_of(&cli);

    if cli.dry_run || url.is_none() {
        let translation = query.to_sql_for(terminal)?;
        print_translation(&translation);
        if url.is_none() && !cli.dry_run {
            println!();
            println!(
                "{}",
                "⚠ No database URL. Use --database-url or set SHADOWQ_DATABASE_URL".yellow()
            );
        }
        return Ok(());
    }

    if dialect != Dialect::Postgres {
        bail!("executing queries needs the postgres dialect; pass --dialect postgres or use --dry-run");
    }

    execute(&ctx, &query, terminal, &cli.format).await
}

/// Run the terminal and print its result. The connection is closed on every
/// path; a query error takes precedence over a close error.
async fn execute<D: AsyncDriver>(
    ctx: &DatabaseContext<D>,
    query: &Query<'_, D>,
    terminal: Terminal,
    format: &OutputFormat,
) -> Result<()> {
    let result = print_terminal(query, terminal, format).await;
    let closed = ctx.close_async().await;
    result?;
    closed?;
    Ok(())
}

async fn print_terminal<D: AsyncDriver>(
    query: &Query<'_, D>,
    terminal: Terminal,
    format: &OutputFormat,
) -> Result<()> {
    match terminal {
        Terminal::Count(_) => {
            let count = query.count_async().await?;
            println!("{}", count.to_string().cyan().bold());
        }
        Terminal::First(_) => {
            let row = query.first_async().await?;
            format_output(&[row], format);
        }
        Terminal::FirstOrDefault(_) => {
            let rows: Vec<Row> = query.first_or_default_async().await?.into_iter().collect();
            format_output(&rows, format);
        }
        Terminal::ToList => {
            let rows = query.to_list_async(&CancellationToken::none()).await?;
            format_output(&rows, format);
        }
    }
    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_query<'c>(ctx: &'c DatabaseContext<SqlxDriver>, cli: &Cli) -> Result<Query<'c, SqlxDriver>> {
    let mut query = if cli.function_args.is_empty() {
        ctx.query_table(&cli.source)?
    } else {
        let args = cli
            .function_args
            .iter()
            .map(|a| parse_cli_value(a))
            .collect::<ShadowResult<Vec<Value>>>()
            .context("invalid --function-arg")?;
        ctx.query_function(&cli.source, args)?
    };

    for filter in &cli.filters {
        let predicate =
            parse_predicate(filter).with_context(|| format!("invalid filter '{}'", filter))?;
        query = query.filter(predicate);
    }

    for (i, key) in cli.order_by.iter().enumerate() {
        let (column, descending) = match key.rsplit_once(':') {
            Some((column, dir)) if dir.eq_ignore_ascii_case("desc") => (column, true),
            Some((column, dir)) if dir.eq_ignore_ascii_case("asc") => (column, false),
            Some(_) => bail!("invalid ordering '{}', expected column[:asc|:desc]", key),
            None => (key.as_str(), false),
        };
        query = match (i, descending) {
            (0, false) => query.order_by(column)?,
            (0, true) => query.order_by_descending(column)?,
            (_, false) => query.then_by(column)?,
            (_, true) => query.then_by_descending(column)?,
        };
    }

    if let Some(n) = cli.skip {
        query = query.skip(n)?;
    }
    if let Some(n) = cli.take {
        query = query.take(n)?;
    }
    if !cli.select.is_empty() {
        query = query.select_only(&cli.select)?;
    }

    Ok(query)
}

fn terminal_of(cli: &Cli) -> Terminal {
    if cli.count {
        Terminal::Count(None)
    } else if cli.first {
        Terminal::First(None)
    } else if cli.first_or_default {
        Terminal::FirstOrDefault(None)
    } else {
        Terminal::ToList
    }
}

/// JSON scalars (numbers, booleans, `null`, quoted strings) are typed;
/// anything that isn't JSON is taken as a bare string.
fn parse_cli_value(raw: &str) -> ShadowResult<Value> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) => Value::from_json("function-arg", &json),
        Err(_) => Ok(Value::String(raw.to_string())),
    }
}

fn print_translation(translation: &Translation) {
    println!("{}", "Generated SQL:".green().bold());
    println!("{}", translation.sql.white());

    if !translation.params.is_empty() {
        println!();
        println!("{}", "Parameters:".cyan());
        for param in &translation.params {
            println!("  {} = {}", param.name, param.value.to_string().yellow());
        }
    }
}

fn format_output(rows: &[Row], format: &OutputFormat) {
    if rows.is_empty() {
        println!("{}", "(no results)".dimmed());
        return;
    }

    match format {
        OutputFormat::Json => {
            let json: Vec<serde_json::Value> = rows.iter().map(Row::to_json).collect();
            println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        }
        OutputFormat::Table => {
            // Columns in first-row order
            let columns: Vec<&str> = rows[0].columns().collect();

            let mut widths: HashMap<&str, usize> = columns.iter().map(|c| (*c, c.len())).collect();
            for row in rows {
                for (col, val) in row.iter() {
                    if let Some(w) = widths.get_mut(col) {
                        *w = (*w).max(cell(val).len());
                    }
                }
            }

            let header: Vec<String> = columns
                .iter()
                .map(|c| format!("{:width$}", c, width = widths[c]))
                .collect();
            println!("{}", header.join(" │ ").white().bold());

            let sep: Vec<String> = columns.iter().map(|c| "─".repeat(widths[c])).collect();
            println!("{}", sep.join("─┼─").dimmed());

            for row in rows {
                let cells: Vec<String> = columns
                    .iter()
                    .map(|c| {
                        let val = row.get(c).map(cell).unwrap_or_default();
                        format!("{:width$}", val, width = widths[c])
                    })
                    .collect();
                println!("{}", cells.join(" │ "));
            }

            println!();
            println!("{} row(s) returned", rows.len().to_string().cyan());
        }
    }
}

fn cell(val: &Value) -> String {
    match val {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
