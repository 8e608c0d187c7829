//! Fluent CLI
//!
//! Main entry point for the `fluent` command.

use clap::{Parser, Subcommand};
use fluent::{CompileError, SourceFile};
use miette::{IntoDiagnostic, Result};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "fluent")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Parser and tooling for the Fluent programming language", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the tokens of a source file
    Tokens {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Parse a source file and print its syntax tree
    Parse {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print the tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a source file in canonical form
    Fmt {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Fail if the file is not already formatted
        #[arg(long)]
        check: bool,
    },

    /// Read a package manifest
    Manifest {
        /// Manifest file
        #[arg(value_name = "FILE", default_value = fluent::manifest::MANIFEST_FILE)]
        input: PathBuf,

        /// Print the package as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show version information
    Info,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Tokens { input } => tokens(&input),
        Commands::Parse { input, json } => parse(&input, json),
        Commands::Fmt { input, check } => format_code(&input, check),
        Commands::Manifest { input, json } => manifest(&input, json),
        Commands::Info => info(),
    }
}

fn read_source(input: &Path) -> Result<SourceFile> {
    let content = std::fs::read_to_string(input)
        .map_err(|e| miette::miette!("Failed to read input file: {}", e))?;
    Ok(SourceFile::new(input.to_string_lossy(), content))
}

fn tokens(input: &Path) -> Result<()> {
    let source = read_source(input)?;
    let tokens = fluent::lexer::lex(&source.content, &source.name)
        .map_err(|e| CompileError::from_lex(&e, &source))?;

    for token in &tokens {
        println!(
            "{:>4}:{:<3} {:<16} {}",
            token.position.line,
            token.position.column,
            token.kind.as_str(),
            token.value
        );
    }
    Ok(())
}

fn parse(input: &Path, json: bool) -> Result<()> {
    tracing::info!("Parsing {:?}", input);

    let source = read_source(input)?;
    let ast = fluent::parse_source(&source.content, &source.name)?;

    if json {
        let json = serde_json::to_string_pretty(&ast)
            .map_err(|e| miette::miette!("Failed to serialize AST: {}", e))?;
        println!("{}", json);
    } else {
        println!("{}", ast.marshal());
    }
    Ok(())
}

fn format_code(input: &Path, check: bool) -> Result<()> {
    let source = read_source(input)?;
    let formatted = fluent::format_source(&source.content, &source.name)?;

    if !check {
        print!("{}", formatted);
        return Ok(());
    }

    if formatted == *source.content {
        tracing::info!("{:?} is formatted", input);
        Ok(())
    } else {
        Err(miette::miette!("{} is not formatted", input.display()))
    }
}

fn manifest(input: &Path, json: bool) -> Result<()> {
    let source = read_source(input)?;
    let package = fluent::manifest::parse_manifest(&source.content, &source.name)
        .map_err(|e| CompileError::from_manifest(&e, &source))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&package).into_diagnostic()?);
        return Ok(());
    }

    for key in fluent::manifest::KEYS {
        let value = package.get(key).unwrap_or_default();
        if !value.is_empty() {
            println!("{:<12} {}", key, value);
        }
    }
    Ok(())
}

fn info() -> Result<()> {
    println!("Fluent Parser");
    println!("Version: {}", fluent::VERSION);
    println!();
    println!("Features:");
    println!("  - Queue-driven parsing without recursion on nesting depth");
    println!("  - Modules, generics, pointers and arrays");
    println!("  - Canonical formatting (fluent fmt)");
    println!("  - Package manifests ({})", fluent::manifest::MANIFEST_FILE);

    Ok(())
}
