//! LFF command line interface
//!
//! A thin wrapper over the processing API: the CLI reads files, delegates
//! to the pure functions in `lff::api`, and renders results. Processing
//! logic lives in the library; this binary only does argument parsing,
//! I/O and exit codes.
//!
//! ```bash
//! lff tokens system.lff         # JSON token stream
//! lff parse system.lff          # JSON LFF AST
//! lff graph system.lff          # JSON graph
//! lff check src/architecture/   # validate every .lff file in a tree
//! lff fmt --preset strict system.lff
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use termcolor::{ColorChoice, StandardStream};

use lff::diagnostics::render::write_colored;
use lff::diagnostics::Diagnostic;
use lff::lexer::LexerOptions;
use lff::serializer::SerializerPreset;
use lff::{Lff, LffOptions};

#[derive(Parser)]
#[command(name = "lff", version, about = "Parse, validate and format LayerFlow (LFF) documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the token stream as JSON
    Tokens {
        file: PathBuf,
        /// Keep comment tokens in the stream
        #[arg(long)]
        include_comments: bool,
    },
    /// Print the LFF AST as JSON
    Parse {
        file: PathBuf,
    },
    /// Print the assembled graph as JSON
    Graph {
        file: PathBuf,
    },
    /// Validate a file, or every .lff file under a directory
    Check {
        path: PathBuf,
        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,
    },
    /// Re-serialize a document under a formatting preset
    Fmt {
        file: PathBuf,
        #[arg(long, default_value = "pretty")]
        preset: String,
        /// Rewrite the file in place instead of printing
        #[arg(long)]
        write: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(clean) => {
            if clean {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<bool, Box<dyn std::error::Error>> {
    match cli.command {
        Command::Tokens {
            file,
            include_comments,
        } => {
            let content = fs::read_to_string(&file)?;
            let output = lff::tokenize(
                &content,
                &LexerOptions {
                    include_comments,
                    collect_metrics: true,
                    enhanced_errors: false,
                },
            );
            let json = serde_json::json!({
                "source": file.display().to_string(),
                "tokens": output.tokens,
                "diagnostics": output.diagnostics,
                "metrics": output.metrics,
                "source_info": output.source_info,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
            Ok(true)
        }
        Command::Parse { file } => {
            let content = fs::read_to_string(&file)?;
            let mut session = Lff::new(cli_options(&file));
            let result = session.parse_to_ast(&content);
            let json = serde_json::json!({
                "source": file.display().to_string(),
                "success": result.success,
                "ast": result.lff_ast,
                "errors": result.errors,
                "warnings": result.warnings,
                "metrics": result.metrics,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
            Ok(result.success)
        }
        Command::Graph { file } => {
            let content = fs::read_to_string(&file)?;
            let mut session = Lff::new(cli_options(&file));
            let result = session.parse_to_ast(&content);
            match result.core_ast {
                Some(graph) => {
                    println!("{}", serde_json::to_string_pretty(&graph.to_json())?);
                    Ok(true)
                }
                None => {
                    report(&result.errors, &file)?;
                    Ok(false)
                }
            }
        }
        Command::Check { path, strict } => check(&path, strict),
        Command::Fmt {
            file,
            preset,
            write,
        } => {
            let preset: SerializerPreset = preset.parse()?;
            let content = fs::read_to_string(&file)?;
            let mut options = cli_options(&file);
            options.serializer = preset.options();
            let mut session = Lff::new(options);
            let result = session.round_trip(&content);
            match result.text {
                Some(text) if result.success => {
                    if write {
                        fs::write(&file, text)?;
                    } else {
                        print!("{}", text);
                    }
                    Ok(true)
                }
                _ => {
                    report(&result.errors, &file)?;
                    Ok(false)
                }
            }
        }
    }
}

/// Validate one file or every `.lff` file below a directory.
fn check(path: &Path, strict: bool) -> Result<bool, Box<dyn std::error::Error>> {
    let files = collect_lff_files(path)?;
    if files.is_empty() {
        eprintln!("no .lff files under {}", path.display());
        return Ok(false);
    }

    let mut clean = true;
    let mut checked = 0;
    for file in files {
        let content = fs::read_to_string(&file)?;
        let mut session = Lff::new(cli_options(&file));
        let outcome = session.validate(&content, strict);
        checked += 1;

        report(&outcome.errors, &file)?;
        report(&outcome.warnings, &file)?;
        if !outcome.valid {
            clean = false;
        }
    }

    if clean {
        println!("{} file(s) ok", checked);
    }
    Ok(clean)
}

fn collect_lff_files(path: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(path) {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some("lff")
        {
            files.push(entry.path().to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn report(diagnostics: &[Diagnostic], file: &Path) -> std::io::Result<()> {
    if diagnostics.is_empty() {
        return Ok(());
    }
    let choice = if atty::is(atty::Stream::Stdout) {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    };
    let mut stdout = StandardStream::stdout(choice);
    let name = file.display().to_string();
    for diagnostic in diagnostics {
        write_colored(&mut stdout, diagnostic, Some(&name))?;
    }
    Ok(())
}

fn cli_options(file: &Path) -> LffOptions {
    let mut options = LffOptions::default();
    options.lexer.enhanced_errors = true;
    options.lexer.collect_metrics = true;
    options.parser.enable_source_info = true;
    options.parser.file_path = Some(file.display().to_string());
    options
}
