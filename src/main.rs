use std::path::PathBuf;
use std::process::ExitCode;
use clap::Parser;
use log::{debug, error, LevelFilter};

use testgen::{
  read_file, ClientConfig, Error, Framework, TestGenerator
};

#[derive(Parser, Debug)]
#[command(name = "testgen")]
#[command(about = "Generate unit tests for a Python module using an LLM")]
#[command(long_about = "Generate unit tests for a Python module using an LLM.\n\n\
Environment Variables:\n\
  DEEPSEEK_API_KEY   API key (required)\n\
  DEEPSEEK_API_URL   API base URL (default https://api.deepseek.com/v1)\n\
  DEEPSEEK_MODEL     Model name (default deepseek-coder)\n\
  MAX_TOKENS         Response token limit (default 2048)\n\
  TEMPERATURE        Sampling temperature, 0 to 2 (default 0.7)\n\
  TOP_P              Nucleus sampling, 0 to 1 (default 0.95)")]
struct Args
{   /// Path to the Python source file
    #[arg(long)]
    input: PathBuf
  , /// Optional path to a specs/requirements file to guide generation
    #[arg(long)]
    specs: Option<PathBuf>
  , /// Where to write the generated tests
    #[arg(long, default_value = "tests/test_generated.py")]
    output: PathBuf
  , /// Test framework to use
    #[arg(long, default_value = "pytest", value_parser = parse_framework)]
    framework: Framework
  , /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String
  , /// Env file loaded before reading configuration
    #[arg(long, default_value = ".env")]
    env_file: PathBuf
  , /// Add a function/class overview of the source to the prompt
    #[arg(long)]
    summarize: bool
  , /// Fail instead of replacing an existing output file
    #[arg(long)]
    no_overwrite: bool
}

fn parse_framework(s: &str) -> Result<Framework, String>
{   s.parse::<Framework>().map_err(|e| e.to_string())
}

fn init_logging(level: &str)
{   let filter = level.parse::<LevelFilter>()
      .unwrap_or(LevelFilter::Info);
    env_logger::Builder::new()
      .filter_level(filter)
      .format_timestamp_secs()
      .init();
}

#[tokio::main]
async fn main() -> ExitCode
{   let args = Args::parse();
    init_logging(&args.log_level);
    debug!("{:?}", args);

    ClientConfig::load_dotenv(&args.env_file);
    let config = match ClientConfig::from_env()
    {   Ok(config) => config
      , Err(e) => {
          println!("Configuration error: {}", e);
          return ExitCode::from(2);
        }
    };
    if let Ok(summary) = serde_json::to_string(&config.summary())
    {   debug!("Config: {}", summary);
    }

    match run(&args, config).await
    {   Ok(path) => {
          println!("Generated tests written to: {}", path.display());
          ExitCode::SUCCESS
        }
      , Err(e) if e.is_config() => {
          println!("Configuration error: {}", e);
          ExitCode::from(2)
        }
      , Err(e) => {
          error!("{}", e);
          println!("Generation failed: {}", e);
          ExitCode::from(1)
        }
    }
}

async fn run(args: &Args, config: ClientConfig)
  -> Result<PathBuf, Error>
{   let code = read_file(&args.input)?;
    let specs = args.specs.as_ref()
      .map(read_file)
      .transpose()?;

    let generator = TestGenerator::from_config(config)?
      .with_source_summary(args.summarize);
    let path = generator
      .generate_and_save(
        &code
      , &args.output
      , specs.as_deref()
      , Some(args.framework.as_str())
      , !args.no_overwrite
      )
      .await;
    generator.close();
    path
}
