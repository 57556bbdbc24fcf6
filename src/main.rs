use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use quire::{Config, Element, ExportFormat};

#[derive(Parser)]
#[command(name = "quire", version)]
#[command(about = "Turn markup drafts into live documents and export them")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log at info level regardless of RUST_LOG
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the parsed block tree of a markup file
    Parse {
        input: PathBuf,
    },
    /// Render a markup file to the live document fragment
    Preview {
        input: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Export a markup file or a saved live document
    Export {
        input: PathBuf,

        #[arg(short, long, value_enum)]
        format: ExportFormat,

        /// Output file (defaults to the configured file stem)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Config file
        #[arg(long, default_value = "quire.toml")]
        config: PathBuf,

        /// Input kind (inferred from the extension when omitted)
        #[arg(long, value_enum)]
        from: Option<InputKind>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputKind {
    Markdown,
    Html,
}

impl InputKind {
    fn infer(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm") => {
                InputKind::Html
            }
            _ => InputKind::Markdown,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Parse { input } => {
            let text = read_input(&input);
            for block in quire::parse(&text) {
                println!("{block:#?}");
            }
        }
        Commands::Preview { input, output } => {
            let html = quire::markup_to_html(&read_input(&input));
            match output {
                Some(path) => write_output(&path, html.as_bytes()),
                None => print!("{html}"),
            }
        }
        Commands::Export {
            input,
            format,
            output,
            config,
            from,
        } => {
            let config = Config::load(&config);
            let text = read_input(&input);
            let tree = match load_tree(&text, from.unwrap_or_else(|| InputKind::infer(&input))) {
                Ok(tree) => tree,
                Err(e) => {
                    eprintln!("Error reading {}: {}", input.display(), e);
                    std::process::exit(1);
                }
            };

            let Some(bytes) = quire::export(format, &tree, &config) else {
                eprintln!("Error: {} export failed", format.extension());
                std::process::exit(1);
            };

            let output = output.unwrap_or_else(|| {
                PathBuf::from(format!("{}.{}", config.output.file_stem, format.extension()))
            });
            write_output(&output, &bytes);
            println!("Created {}", output.display());
        }
    }
}

fn load_tree(text: &str, kind: InputKind) -> Result<Element, quire::TreeError> {
    match kind {
        InputKind::Markdown => quire::markup_to_tree(text),
        InputKind::Html => quire::parse_document(text),
    }
}

fn read_input(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn write_output(path: &Path, bytes: &[u8]) {
    if let Err(e) = fs::write(path, bytes) {
        eprintln!("Error writing {}: {}", path.display(), e);
        std::process::exit(1);
    }
}
