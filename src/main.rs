//! Command-line interface for ocx-schema

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use ocx_schema::check::check_schema_names;
#[cfg(feature = "cli")]
use ocx_schema::loaders::Loader;
#[cfg(feature = "cli")]
use ocx_schema::locations::Location;
#[cfg(feature = "cli")]
use ocx_schema::schema::tables::{self, Table};
#[cfg(feature = "cli")]
use ocx_schema::{Config, SchemaSession};

#[cfg(feature = "cli")]
type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "ocx-schema")]
#[command(author, version, about = "OCX schema parser and resolution engine", long_about = None)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Per-namespace summary of a schema
    Summary {
        /// Path or URL of the schema
        #[arg(value_name = "SCHEMA")]
        schema: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Properties, attributes and children of one global element
    Element {
        /// Path or URL of the schema
        #[arg(value_name = "SCHEMA")]
        schema: String,

        /// Prefixed element name, e.g. ocx:Vessel
        #[arg(value_name = "NAME")]
        name: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Enumerated attribute types
    Enums {
        /// Path or URL of the schema
        #[arg(value_name = "SCHEMA")]
        schema: String,

        /// Show the values of the enumerators with this name
        #[arg(short, long)]
        name: Option<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Global simple types
    #[command(name = "simple-types")]
    SimpleTypes {
        /// Path or URL of the schema
        #[arg(value_name = "SCHEMA")]
        schema: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Global attributes
    Attributes {
        /// Path or URL of the schema
        #[arg(value_name = "SCHEMA")]
        schema: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Substitution groups and their members
    Groups {
        /// Path or URL of the schema
        #[arg(value_name = "SCHEMA")]
        schema: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Check element and attribute naming conventions
    Check {
        /// Path or URL of the schema
        #[arg(value_name = "SCHEMA")]
        schema: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Download a schema and everything it references
    Download {
        /// URL of the schema
        #[arg(value_name = "URL")]
        url: String,

        /// Target folder (defaults to the configured schema folder)
        #[arg(short, long)]
        folder: Option<PathBuf>,
    },
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = load_config(cli.config.as_ref()).and_then(|config| match cli.command {
        Commands::Summary { schema, json } => cmd_summary(config, &schema, json),
        Commands::Element { schema, name, json } => cmd_element(config, &schema, &name, json),
        Commands::Enums { schema, name, json } => cmd_enums(config, &schema, name.as_deref(), json),
        Commands::SimpleTypes { schema, json } => cmd_simple_types(config, &schema, json),
        Commands::Attributes { schema, json } => cmd_attributes(config, &schema, json),
        Commands::Groups { schema, json } => cmd_groups(config, &schema, json),
        Commands::Check { schema, json } => cmd_check(config, &schema, json),
        Commands::Download { url, folder } => cmd_download(config, &url, folder),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn load_config(path: Option<&PathBuf>) -> CliResult<Config> {
    match path {
        Some(path) => Ok(Config::from_file(path)?),
        None => Ok(Config::default()),
    }
}

#[cfg(feature = "cli")]
fn open_session(config: Config, schema: &str) -> CliResult<SchemaSession> {
    let mut session = SchemaSession::new(config);
    session.process_schema(schema)?;
    if !session.is_complete() {
        for failure in &session.ingest_report().failures {
            eprintln!("Warning: {} was not loaded: {}", failure.location, failure.error);
        }
    }
    Ok(session)
}

#[cfg(feature = "cli")]
fn print_table(title: &str, table: &Table) {
    println!("{}", title);
    println!("{}", table.render());
}

#[cfg(feature = "cli")]
fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_summary(config: Config, schema: &str, json: bool) -> CliResult<()> {
    let session = open_session(config, schema)?;
    let summary = session.summary();

    if json {
        let output = serde_json::json!({
            "version": session.schema_version(),
            "namespaces": summary,
            "changes": session.schema_changes(),
        });
        return print_json(&output);
    }

    println!("Schema version: {}", session.schema_version().unwrap_or("unknown"));
    println!("Documents: {}", session.ingest_report().documents.len());
    println!();
    print_table("Namespaces", &summary);
    if !session.schema_changes().is_empty() {
        println!();
        print_table("Changes", &tables::schema_change_table(session.schema_changes()));
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_element(config: Config, schema: &str, name: &str, json: bool) -> CliResult<()> {
    let session = open_session(config, schema)?;
    let element = session
        .element_by_name(name)
        .ok_or_else(|| format!("Element not found: {}", name))?;

    if json {
        return print_json(element);
    }

    print_table("Properties", &tables::properties_table(element));
    let parents = element.parent_names();
    if !parents.is_empty() {
        println!("Supertypes: {}", parents.join(" -> "));
    }
    println!();
    print_table("Attributes", &tables::attribute_table(element));
    println!();
    print_table("Children", &tables::child_table(element));
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_enums(config: Config, schema: &str, name: Option<&str>, json: bool) -> CliResult<()> {
    let session = open_session(config, schema)?;

    let Some(name) = name else {
        let enumerators: Vec<_> = session.enumerators().collect();
        if json {
            return print_json(&enumerators);
        }
        print_table("Enumerators", &tables::enumerator_types(enumerators));
        return Ok(());
    };

    let enumerators = session.enumerators_named(name);
    if enumerators.is_empty() {
        return Err(format!("Enumerator not found: {}", name).into());
    }
    if json {
        return print_json(&enumerators);
    }
    for enumerator in enumerators {
        print_table(&enumerator.tag.to_string(), &tables::enumerator_table(enumerator));
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_simple_types(config: Config, schema: &str, json: bool) -> CliResult<()> {
    let session = open_session(config, schema)?;
    if json {
        return print_json(session.simple_types());
    }
    print_table("Simple types", &tables::schema_attribute_table(session.simple_types()));
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_attributes(config: Config, schema: &str, json: bool) -> CliResult<()> {
    let session = open_session(config, schema)?;
    if json {
        return print_json(session.global_attributes());
    }
    print_table("Attributes", &tables::schema_attribute_table(session.global_attributes()));
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_groups(config: Config, schema: &str, json: bool) -> CliResult<()> {
    let session = open_session(config, schema)?;
    let groups = session.substitution_groups();
    if json {
        return print_json(groups);
    }

    let mut table = Table::new(["Group", "Members"]);
    for (head, members) in groups.iter() {
        let members: Vec<String> = members.iter().map(|m| m.to_string()).collect();
        table.push_row([head.to_string(), members.join(", ")]);
    }
    print_table("Substitution groups", &table);
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_check(config: Config, schema: &str, json: bool) -> CliResult<()> {
    let session = open_session(config, schema)?;
    let report = check_schema_names(&session);

    if json {
        print_json(&report)?;
    } else if report.passed {
        println!("All names follow the naming conventions");
    } else {
        for (group, names) in &report.failures {
            println!("Names failing the {} check ({}):", group, names.len());
            for name in names {
                println!("  - {}", name);
            }
        }
    }

    if !report.passed {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_download(config: Config, url: &str, folder: Option<PathBuf>) -> CliResult<()> {
    let folder = folder.unwrap_or_else(|| config.schema_folder.clone());
    let loader = Loader::new()
        .with_limits(config.limits.clone())
        .with_cache_folder(&folder);

    let downloaded = loader.download_all(&Location::parse(url)?)?;
    println!("Downloaded {} schema(s) to {}", downloaded.len(), folder.display());
    for uri in downloaded {
        println!("  - {}", uri);
    }
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
