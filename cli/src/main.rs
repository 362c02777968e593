//! Shapecheck CLI: load RDF data, run a validation plan, print the report
//!
//! Exit status is 0 when the data conforms, 1 when violations or faults were
//! found and 2 on any error.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use shapecheck::rdf::{RdfFormat, RdfParser, Term, TripleStore};
use shapecheck::validation::{
    EngineConfig, FunctionRegistry, ValidationEngine, ValidationPlan, ValidationReport,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;

#[derive(Parser)]
#[command(name = "shapecheck", version, about = "Validate RDF data with validation plans")]
struct Cli {
    /// Output format
    #[arg(long, default_value = "table", global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum DataFormat {
    Turtle,
    Ntriples,
}

impl From<DataFormat> for RdfFormat {
    fn from(format: DataFormat) -> Self {
        match format {
            DataFormat::Turtle => RdfFormat::Turtle,
            DataFormat::Ntriples => RdfFormat::NTriples,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a data file against a plan
    Validate {
        /// RDF data file
        #[arg(long)]
        data: PathBuf,

        /// Data format; guessed from the file extension when omitted
        #[arg(long)]
        format: Option<DataFormat>,

        /// Validation plan (YAML)
        #[arg(long)]
        plan: PathBuf,

        /// Engine configuration (YAML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Materialize rules before validating
        #[arg(long)]
        rules: bool,
    },
    /// Print the triples matching a pattern
    Find {
        /// RDF data file
        #[arg(long)]
        data: PathBuf,

        /// Data format; guessed from the file extension when omitted
        #[arg(long)]
        format: Option<DataFormat>,

        /// Subject in N-Triples syntax
        #[arg(long)]
        subject: Option<String>,

        /// Predicate in N-Triples syntax
        #[arg(long)]
        predicate: Option<String>,

        /// Object in N-Triples syntax
        #[arg(long)]
        object: Option<String>,
    },
    /// List the stock functions
    Functions,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate {
            data,
            format,
            plan,
            config,
            rules,
        } => run_validate(&data, format, &plan, config.as_deref(), rules, &cli.output),
        Commands::Find {
            data,
            format,
            subject,
            predicate,
            object,
        } => run_find(&data, format, [subject, predicate, object], &cli.output),
        Commands::Functions => run_functions(&cli.output),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn load(path: &Path, format: Option<DataFormat>) -> Result<TripleStore> {
    let format = match format {
        Some(format) => format.into(),
        None => RdfFormat::from_path(path)
            .with_context(|| format!("cannot tell the RDF format of {}", path.display()))?,
    };
    let store = TripleStore::new();
    let loaded = RdfParser::load_file(&store, path, format)
        .with_context(|| format!("failed to load {}", path.display()))?;
    info!("Loaded {} triples from {:?}", loaded, path);
    Ok(store)
}

fn run_validate(
    data: &Path,
    format: Option<DataFormat>,
    plan: &Path,
    config: Option<&Path>,
    rules: bool,
    output: &OutputFormat,
) -> Result<ExitCode> {
    let config = match config {
        Some(path) => EngineConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let plan = ValidationPlan::from_file(plan)
        .with_context(|| format!("failed to load {}", plan.display()))?;
    let shapes = plan.shapes(&FunctionRegistry::with_builtins())?;
    let store = load(data, format)?;

    let engine = ValidationEngine::new(config)?;
    if rules {
        let inferred = engine.apply_all_rules(&store, &shapes)?;
        info!(
            "Rules inferred {} triples in {} rounds",
            inferred.inferred, inferred.iterations
        );
    }
    let report = engine.validate(&store, &shapes)?;

    match output {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Table => print_report(&report),
    }

    Ok(if report.conforms {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn print_report(report: &ValidationReport) {
    println!("Conforms: {}", report.conforms);
    if !report.results.is_empty() {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Shape", "Function", "Focus", "Value", "Path", "Message"]);
        for r in &report.results {
            table.add_row(vec![
                r.shape.clone(),
                r.source.clone(),
                r.focus_node.to_string(),
                r.value.to_string(),
                r.path.as_ref().map(|p| p.to_string()).unwrap_or_default(),
                r.messages.join("\n"),
            ]);
        }
        println!("{}", table);
        println!("{} violation(s)", report.results.len());
    }
    if !report.faults.is_empty() {
        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Shape", "Function", "Focus", "Fault"]);
        for f in &report.faults {
            table.add_row(vec![
                f.shape.clone(),
                f.source.clone(),
                f.focus_node.as_ref().map(|n| n.to_string()).unwrap_or_default(),
                f.message.clone(),
            ]);
        }
        println!("{}", table);
        println!("{} fault(s)", report.faults.len());
    }
}

fn run_find(
    data: &Path,
    format: Option<DataFormat>,
    pattern: [Option<String>; 3],
    output: &OutputFormat,
) -> Result<ExitCode> {
    let store = load(data, format)?;
    let [s, p, o] = pattern.map(|text| text.as_deref().map(Term::parse).transpose());
    let (s, p, o) = (s?, p?, o?);

    let triples = store.find(s.as_ref(), p.as_ref(), o.as_ref()).collect_triples();
    match output {
        OutputFormat::Json => {
            let lines: Vec<String> = triples.iter().map(|t| t.to_string()).collect();
            println!("{}", serde_json::to_string_pretty(&lines)?);
        }
        OutputFormat::Table => {
            for triple in &triples {
                println!("{}", triple);
            }
            println!("{} triple(s)", triples.len());
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_functions(output: &OutputFormat) -> Result<ExitCode> {
    let registry = FunctionRegistry::with_builtins();
    let rows: Vec<(String, String, String)> = registry
        .names()
        .filter_map(|name| registry.get(name))
        .map(|f| {
            let sig = f.signature();
            let params: Vec<String> = sig
                .parameters
                .iter()
                .map(|p| if p.optional { format!("${}?", p.name) } else { format!("${}", p.name) })
                .collect();
            let kind = if sig.per_focus {
                format!("{} (per focus)", sig.kind)
            } else {
                sig.kind.to_string()
            };
            (sig.name.clone(), kind, params.join(", "))
        })
        .collect();

    match output {
        OutputFormat::Json => {
            let json: Vec<_> = rows
                .iter()
                .map(|(name, kind, params)| {
                    serde_json::json!({ "name": name, "kind": kind, "parameters": params })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_header(vec!["Function", "Kind", "Parameters"]);
            for (name, kind, params) in rows {
                table.add_row(vec![name, kind, params]);
            }
            println!("{}", table);
        }
    }
    Ok(ExitCode::SUCCESS)
}
