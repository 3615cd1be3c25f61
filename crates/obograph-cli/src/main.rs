//! obograph CLI
//!
//! Load an OBO ontology and answer structural questions about it:
//! - summary of the file (`info`)
//! - closure and neighbor queries (`ancestors`, `descendants`, `parents`, `children`)
//! - pairwise relations (`path`, `siblings`)
//! - label listing and a JSON snapshot of the whole graph (`labels`, `export`)

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use colored::Colorize;
use obograph_ontology::{LoadOptions, Ontology, TermId};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod config;

use config::LoadArgs;

#[derive(Parser)]
#[command(name = "obograph")]
#[command(author, version, about = "Query OBO ontologies as directed graphs")]
struct Cli {
    #[command(flatten)]
    load: LoadArgs,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Raise log verbosity (`-v` info, `-vv` debug); `RUST_LOG` wins when set
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize an ontology: root, term and edge counts, header tags.
    Info {
        /// Input `.obo` file
        input: PathBuf,
    },

    /// All more generic terms of a term.
    Ancestors(TermQuery),

    /// All more specific terms of a term.
    Descendants(TermQuery),

    /// Direct parents of a term.
    Parents(TermQuery),

    /// Direct children of a term.
    Children(TermQuery),

    /// Whether `src` is a strict ancestor of `dest`.
    Path {
        input: PathBuf,
        src: TermId,
        dest: TermId,
    },

    /// Whether two terms share a direct parent.
    Siblings {
        input: PathBuf,
        a: TermId,
        b: TermId,
    },

    /// List every labeled term as `id<TAB>label`.
    Labels {
        input: PathBuf,
    },

    /// Write the graph (nodes with attributes, edges with kinds) as sorted JSON.
    Export {
        input: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

#[derive(Args)]
struct TermQuery {
    /// Input `.obo` file
    input: PathBuf,
    /// Term id
    term: TermId,
    /// Include the term itself in the result
    #[arg(long)]
    include_self: bool,
}

#[derive(Clone, Copy)]
enum Relation {
    Ancestors,
    Descendants,
    Parents,
    Children,
}

impl Relation {
    fn name(self) -> &'static str {
        match self {
            Relation::Ancestors => "ancestors",
            Relation::Descendants => "descendants",
            Relation::Parents => "parents",
            Relation::Children => "children",
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = cli.load.resolve()?;
    debug!(?options, "resolved load options");
    let out = Output { json: cli.json };

    match cli.command {
        Commands::Info { input } => cmd_info(&out, &load(&input, &options)?),
        Commands::Ancestors(q) => cmd_related(&out, &options, q, Relation::Ancestors),
        Commands::Descendants(q) => cmd_related(&out, &options, q, Relation::Descendants),
        Commands::Parents(q) => cmd_related(&out, &options, q, Relation::Parents),
        Commands::Children(q) => cmd_related(&out, &options, q, Relation::Children),
        Commands::Path { input, src, dest } => {
            let ontology = load(&input, &options)?;
            let exists = ontology.exists_path(&src, &dest)?;
            out.answer("path", &src, &dest, exists)
        }
        Commands::Siblings { input, a, b } => {
            let ontology = load(&input, &options)?;
            let siblings = ontology.terms_are_siblings(&a, &b)?;
            out.answer("siblings", &a, &b, siblings)
        }
        Commands::Labels { input } => cmd_labels(&out, &load(&input, &options)?),
        Commands::Export { input, out: path } => {
            cmd_export(&load(&input, &options)?, path.as_deref())
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(input: &Path, options: &LoadOptions) -> Result<Ontology> {
    Ontology::from_path_with(input, options)
        .with_context(|| format!("failed to load ontology {}", input.display()))
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Serialize)]
struct InfoReport<'a> {
    root: &'a str,
    root_label: Option<&'a str>,
    terms: usize,
    edges: usize,
    typedefs: usize,
    format_version: Option<&'a str>,
    data_version: Option<&'a str>,
    ontology: Option<&'a str>,
}

fn cmd_info(out: &Output, ontology: &Ontology) -> Result<()> {
    let header = |tag: &str| {
        ontology
            .header()
            .get(tag)
            .and_then(|values| values.first())
            .map(String::as_str)
    };
    let report = InfoReport {
        root: ontology.root_id(),
        root_label: ontology.label(ontology.root_id())?,
        terms: ontology.len(),
        edges: ontology.graph().edge_count(),
        typedefs: ontology.typedefs().len(),
        format_version: header("format-version"),
        data_version: header("data-version"),
        ontology: header("ontology"),
    };

    if out.json {
        return print_json(&report);
    }

    let root = match report.root_label {
        Some(label) => format!("{} ({label})", report.root.bold()),
        None => report.root.bold().to_string(),
    };
    println!("{} {root}", "root:".cyan().bold());
    println!("{} {}", "terms:".cyan().bold(), report.terms);
    println!("{} {}", "edges:".cyan().bold(), report.edges);
    println!("{} {}", "typedefs:".cyan().bold(), report.typedefs);
    for (key, value) in [
        ("ontology:", report.ontology),
        ("format-version:", report.format_version),
        ("data-version:", report.data_version),
    ] {
        if let Some(value) = value {
            println!("{} {value}", key.cyan().bold());
        }
    }
    Ok(())
}

fn cmd_related(out: &Output, options: &LoadOptions, q: TermQuery, relation: Relation) -> Result<()> {
    let ontology = load(&q.input, options)?;
    let terms = match relation {
        Relation::Ancestors => ontology.ancestors(&q.term, q.include_self)?,
        Relation::Descendants => ontology.descendants(&q.term, q.include_self)?,
        Relation::Parents => ontology.parents(&q.term, q.include_self)?,
        Relation::Children => ontology.children(&q.term, q.include_self)?,
    };
    out.term_list(&ontology, relation.name(), &q.term, &terms)
}

fn cmd_labels(out: &Output, ontology: &Ontology) -> Result<()> {
    let labels = ontology.term_id_to_label_map();
    if out.json {
        return print_json(&labels);
    }
    for (id, label) in &labels {
        println!("{id}\t{label}");
    }
    Ok(())
}

fn cmd_export(ontology: &Ontology, path: Option<&Path>) -> Result<()> {
    let snapshot = ontology.graph().snapshot();
    match path {
        Some(path) => {
            let text = serde_json::to_string_pretty(&snapshot)?;
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
            Ok(())
        }
        None => print_json(&snapshot),
    }
}

// ============================================================================
// Output
// ============================================================================

struct Output {
    json: bool,
}

#[derive(Serialize)]
struct TermListReport<'a> {
    query: &'a str,
    term: &'a str,
    results: &'a BTreeSet<TermId>,
}

#[derive(Serialize)]
struct AnswerReport<'a> {
    query: &'a str,
    a: &'a str,
    b: &'a str,
    answer: bool,
}

impl Output {
    fn term_list(
        &self,
        ontology: &Ontology,
        query: &str,
        term: &str,
        results: &BTreeSet<TermId>,
    ) -> Result<()> {
        if self.json {
            return print_json(&TermListReport {
                query,
                term,
                results,
            });
        }
        eprintln!(
            "{} {} of {}: {}",
            "ok".green().bold(),
            query,
            term.bold(),
            results.len()
        );
        for id in results {
            match ontology.label(id)? {
                Some(label) => println!("{id}\t{}", label.dimmed()),
                None => println!("{id}"),
            }
        }
        Ok(())
    }

    fn answer(&self, query: &str, a: &str, b: &str, answer: bool) -> Result<()> {
        if self.json {
            return print_json(&AnswerReport { query, a, b, answer });
        }
        let shown = if answer {
            "true".green().bold()
        } else {
            "false".red().bold()
        };
        println!("{shown}");
        Ok(())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
