// src/runtime_interface.rs

use clap::{Args, Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

use crate::blocks::TensorBlocks;
use crate::config::{ConfigError, TensorConfig};
use crate::host::{HostValue, JsonHost};

// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Shape, path and layout operations on nested JSON arrays", long_about = None)]
pub struct CliArgs {
    /// JSON config file (see `TensorConfig`)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Pretty-print results
    #[arg(long, global = true)]
    pretty: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Where the tensor argument comes from: inline JSON or a file.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct TensorInput {
    /// Tensor as JSON text, e.g. '[[1,2],[3,4]]'
    #[arg(long)]
    tensor: Option<String>,

    /// File containing the tensor as JSON
    #[arg(long)]
    tensor_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Empty tensor
    Blank,
    /// Tensor of the given shape, filled with null
    BlankSize {
        #[arg(long)]
        shape: String,
    },
    /// Element at a 1-based path
    GetPath {
        #[arg(long)]
        path: String,
        #[command(flatten)]
        input: TensorInput,
    },
    /// 1-based path of the first leaf equal to a value
    FindPath {
        #[arg(long)]
        value: String,
        #[command(flatten)]
        input: TensorInput,
    },
    /// Whether any leaf equals a value
    Has {
        #[arg(long)]
        value: String,
        #[command(flatten)]
        input: TensorInput,
    },
    /// Shape of a tensor
    Shape {
        #[command(flatten)]
        input: TensorInput,
    },
    /// Rank of a tensor
    Rank {
        #[command(flatten)]
        input: TensorInput,
    },
    /// Number of scalar leaves
    Size {
        #[command(flatten)]
        input: TensorInput,
    },
    /// Copy of a tensor with the element at a path replaced
    SetPath {
        #[arg(long)]
        path: String,
        #[arg(long)]
        value: String,
        #[command(flatten)]
        input: TensorInput,
    },
    /// Reshape a tensor, padding with null or truncating
    Reshape {
        #[arg(long)]
        shape: String,
        #[command(flatten)]
        input: TensorInput,
    },
    /// Replace every leaf with a value
    Fill {
        #[arg(long)]
        value: String,
        #[command(flatten)]
        input: TensorInput,
    },
    /// Reverse the axis order
    Transpose {
        #[command(flatten)]
        input: TensorInput,
    },
    /// Whether the input is a regular tensor
    Valid {
        #[command(flatten)]
        input: TensorInput,
    },
}

// Error wrapper for everything the CLI can fail on
#[derive(Debug)]
pub enum RuntimeError {
    Config(ConfigError),
    Io(std::io::Error),
    Json(serde_json::Error),
    Message(String),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::Config(e) => write!(f, "Config error: {}", e),
            RuntimeError::Io(e) => write!(f, "IO error: {}", e),
            RuntimeError::Json(e) => write!(f, "JSON error: {}", e),
            RuntimeError::Message(s) => write!(f, "Runtime error: {}", s),
        }
    }
}

impl Error for RuntimeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RuntimeError::Config(e) => Some(e),
            RuntimeError::Io(e) => Some(e),
            RuntimeError::Json(e) => Some(e),
            RuntimeError::Message(_) => None,
        }
    }
}

impl From<ConfigError> for RuntimeError {
    fn from(err: ConfigError) -> Self {
        RuntimeError::Config(err)
    }
}
impl From<std::io::Error> for RuntimeError {
    fn from(err: std::io::Error) -> Self {
        RuntimeError::Io(err)
    }
}
impl From<serde_json::Error> for RuntimeError {
    fn from(err: serde_json::Error) -> Self {
        RuntimeError::Json(err)
    }
}

impl TensorInput {
    /// The tensor argument as the host sees it: raw text, coerced later by the blocks.
    fn read(&self) -> Result<HostValue, RuntimeError> {
        match (&self.tensor, &self.tensor_file) {
            (Some(text), _) => Ok(HostValue::text(text)),
            (None, Some(path)) => {
                log::debug!("Reading tensor from {}", path.display());
                let contents = std::fs::read_to_string(path)?;
                Ok(HostValue::text(contents.trim()))
            }
            (None, None) => Err(RuntimeError::Message(
                "either --tensor or --tensor-file is required".to_string(),
            )),
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
    // A second initialisation (e.g. in-process callers) is harmless
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Runs one command and returns the result rendered as JSON.
pub fn execute(args: &CliArgs) -> Result<String, RuntimeError> {
    let mut config = match &args.config {
        Some(path) => TensorConfig::load(path)?,
        None => TensorConfig::default(),
    };
    if args.pretty {
        config.pretty_output = true;
    }

    let blocks = TensorBlocks::new(JsonHost, config);
    let result = match &args.command {
        Command::Blank => blocks.blank(),
        Command::BlankSize { shape } => blocks.blank_size(&HostValue::text(shape)),
        Command::GetPath { path, input } => blocks.get_path(&HostValue::text(path), &input.read()?),
        Command::FindPath { value, input } => {
            blocks.find_path(&HostValue::from_argument(value), &input.read()?)
        }
        Command::Has { value, input } => blocks.has(&input.read()?, &HostValue::from_argument(value)),
        Command::Shape { input } => blocks.shape(&input.read()?),
        Command::Rank { input } => blocks.rank(&input.read()?),
        Command::Size { input } => blocks.size(&input.read()?),
        Command::SetPath { path, value, input } => blocks.set_path(
            &HostValue::text(path),
            &input.read()?,
            &HostValue::from_argument(value),
        ),
        Command::Reshape { shape, input } => blocks.reshape(&input.read()?, &HostValue::text(shape)),
        Command::Fill { value, input } => blocks.fill(&input.read()?, &HostValue::from_argument(value)),
        Command::Transpose { input } => blocks.transpose(&input.read()?),
        Command::Valid { input } => blocks.valid(&input.read()?),
    };

    Ok(result.to_json(blocks.config().pretty_output)?)
}

pub fn run_cli() -> Result<(), Box<dyn Error>> {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    let output = execute(&args)?;
    println!("{}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(argv: &[&str]) -> Result<String, RuntimeError> {
        let mut full = vec!["tensor_cli"];
        full.extend_from_slice(argv);
        let args = CliArgs::try_parse_from(full).expect("arguments should parse");
        execute(&args)
    }

    #[test]
    fn test_execute_shape() {
        assert_eq!(run(&["shape", "--tensor", "[[1,2],[3,4],[5,6]]"]).unwrap(), "[3,2]");
    }

    #[test]
    fn test_execute_value_arguments_parse_as_json() {
        assert_eq!(run(&["has", "--tensor", "[1,2]", "--value", "2"]).unwrap(), "true");
        assert_eq!(run(&["has", "--tensor", "[1,2]", "--value", "\"2\""]).unwrap(), "false");
        assert_eq!(run(&["find-path", "--tensor", "[[\"a\"],[\"b\"]]", "--value", "b"]).unwrap(), "[2,1]");
    }

    #[test]
    fn test_execute_missing_config() {
        let result = run(&["--config", "no/such/config.json", "blank"]);
        assert!(matches!(result, Err(RuntimeError::Config(ConfigError::NotFound(_)))));
    }

    #[test]
    fn test_tensor_and_tensor_file_conflict() {
        let result = CliArgs::try_parse_from(["tensor_cli", "shape", "--tensor", "[1]", "--tensor-file", "x.json"]);
        assert!(result.is_err());
        let result = CliArgs::try_parse_from(["tensor_cli", "shape"]);
        assert!(result.is_err());
    }
}
