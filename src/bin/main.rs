//! scimql CLI - inspect catalogs, print generated SQL, run queries on SQLite
//!
//! Usage:
//!   scimql check [--catalog <file.toml>]
//!   scimql plan --resource <type> --tenant <id> [--filter <json>] [--sort-by <path>] ...
//!   scimql query --db <file.db> --resource <type> --tenant <id> ...
//!
//! Examples:
//!   scimql check
//!   scimql plan --resource User --tenant master --sort-by name.familyName --dialect tsql
//!   scimql plan --resource Group --tenant master \
//!       --filter '{"comparison": {"path": "displayName", "op": "sw", "value": "adm"}}'
//!   scimql query --db keycloak.db --resource User --tenant master --count 10

use clap::{Args, Parser, Subcommand, ValueEnum};
use rusqlite::Connection;
use scimql::catalog;
use scimql::config::Settings;
use scimql::executor::SqliteExecutor;
use scimql::filter::FilterNode;
use scimql::mapping::ResourceRegistry;
use scimql::planner::SortOrder;
use scimql::sql::{BoundSql, Dialect, SqlValue};
use scimql::{QueryEngine, QueryRequest};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "scimql")]
#[command(about = "scimql - compile SCIM resource queries to multi-dialect SQL")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to SCIMQL_CONFIG, ./scimql.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Resource catalog replacing the built-in Keycloak mappings
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the catalog self-check and list resource types
    Check,

    /// Print the SQL generated for a request
    Plan {
        #[command(flatten)]
        request: RequestArgs,

        /// SQL dialect to generate (defaults to query.dialect from settings)
        #[arg(short, long)]
        dialect: Option<DialectArg>,
    },

    /// Execute a request against a SQLite database and print JSON
    Query {
        #[command(flatten)]
        request: RequestArgs,

        /// SQLite database file (defaults to database.path from settings)
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RequestArgs {
    /// Resource type name or endpoint (User, Groups, ...)
    #[arg(short, long)]
    resource: String,

    /// Tenant (realm) id
    #[arg(short, long)]
    tenant: String,

    /// Filter tree as JSON
    #[arg(short, long)]
    filter: Option<String>,

    /// Attribute path to sort by
    #[arg(long)]
    sort_by: Option<String>,

    /// Sort direction
    #[arg(long)]
    sort_order: Option<SortOrderArg>,

    /// 1-based index of the first result
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    start_index: i64,

    /// Page size
    #[arg(long, allow_negative_numbers = true)]
    count: Option<i64>,
}

impl RequestArgs {
    fn to_request(&self) -> Result<QueryRequest, String> {
        let mut request = QueryRequest::new(&self.resource, &self.tenant)
            .page(self.start_index, self.count);
        if let Some(json) = &self.filter {
            let node: FilterNode =
                serde_json::from_str(json).map_err(|e| format!("Invalid filter JSON: {}", e))?;
            request = request.filter(node);
        }
        if let Some(path) = &self.sort_by {
            request = request.sort_by(path);
        }
        if let Some(order) = &self.sort_order {
            request = request.sort_order(order.clone().into());
        }
        Ok(request)
    }
}

#[derive(Clone, ValueEnum)]
enum DialectArg {
    Postgres,
    Mysql,
    Sqlite,
    Tsql,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Mysql => Dialect::MySql,
            DialectArg::Sqlite => Dialect::Sqlite,
            DialectArg::Tsql => Dialect::TSql,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum SortOrderArg {
    Asc,
    Desc,
}

impl From<SortOrderArg> for SortOrder {
    fn from(arg: SortOrderArg) -> Self {
        match arg {
            SortOrderArg::Asc => SortOrder::Ascending,
            SortOrderArg::Desc => SortOrder::Descending,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("scimql=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let registry = match load_registry(cli.catalog.clone(), &settings) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Catalog error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Check => cmd_check(&registry),
        Commands::Plan { request, dialect } => cmd_plan(&registry, settings, request, dialect),
        Commands::Query { request, db } => cmd_query(&registry, settings, request, db),
    }
}

fn load_registry(
    explicit: Option<PathBuf>,
    settings: &Settings,
) -> Result<ResourceRegistry, String> {
    let path = match explicit {
        Some(path) => Some(path),
        None => settings.catalog.resolved_path().map_err(|e| e.to_string())?,
    };
    let decl = match path {
        Some(path) => catalog::load(&path),
        None => catalog::keycloak_decl(),
    }
    .map_err(|e| e.to_string())?;
    ResourceRegistry::from_decl(&decl).map_err(|e| e.to_string())
}

fn cmd_check(registry: &ResourceRegistry) -> ExitCode {
    println!("Resource types:");
    for resource in registry.iter() {
        println!(
            "  - {} ({}, root {}): {} attributes, {} associations",
            resource.name,
            resource.schema,
            resource.root,
            resource.attributes().len(),
            resource.associations().len()
        );
        for extension in &resource.extensions {
            println!("      extension {}", extension);
        }
    }
    println!();
    println!("Self-check passed");
    ExitCode::SUCCESS
}

fn cmd_plan(
    registry: &ResourceRegistry,
    mut settings: Settings,
    args: RequestArgs,
    dialect: Option<DialectArg>,
) -> ExitCode {
    if let Some(dialect) = dialect {
        settings.query.dialect = dialect.into();
    }
    let dialect = settings.query.dialect;

    let request = match args.to_request() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let engine = QueryEngine::new(registry, settings.query);
    let plan = match engine.plan(&request) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Planning error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("-- Resource: {}", plan.resource);
    println!("-- Dialect: {}", dialect);
    println!(
        "-- Page: startIndex={} offset={} limit={}",
        plan.page.start_index, plan.page.offset, plan.page.limit
    );
    println!("-- Columns: {}", plan.labels.join(", "));
    println!();
    print_statement("Rows", &plan.rows.bind(dialect));
    print_statement("Count", &plan.count.bind(dialect));
    for association in &plan.associations {
        // One placeholder stands in for the page ids.
        let bound = association.query_for(&[SqlValue::Null]).bind(dialect);
        println!("-- Association: {} (bound to the ids of the page)", association.name);
        println!("{};", bound.sql);
        println!();
    }
    ExitCode::SUCCESS
}

fn print_statement(title: &str, bound: &BoundSql) {
    println!("-- {}", title);
    println!("{};", bound.sql);
    if !bound.params.is_empty() {
        let params: Vec<String> = bound.params.iter().map(|p| format!("{:?}", p)).collect();
        println!("-- params: [{}]", params.join(", "));
    }
    println!();
}

fn cmd_query(
    registry: &ResourceRegistry,
    mut settings: Settings,
    args: RequestArgs,
    db: Option<PathBuf>,
) -> ExitCode {
    let path = match db {
        Some(path) => path,
        None => match settings.database.resolved_path() {
            Ok(Some(path)) => path,
            Ok(None) => {
                eprintln!("No database given: pass --db or set database.path");
                return ExitCode::FAILURE;
            }
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                return ExitCode::FAILURE;
            }
        },
    };

    let request = match args.to_request() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let conn = match Connection::open(&path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error opening database '{}': {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    settings.query.dialect = Dialect::Sqlite;
    let engine = QueryEngine::new(registry, settings.query);
    let mut executor = SqliteExecutor::new(&conn);

    match engine.query(&mut executor, &request) {
        Ok(result) => match serde_json::to_string_pretty(&result) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error serializing result: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("Query error: {}", e);
            ExitCode::FAILURE
        }
    }
}
