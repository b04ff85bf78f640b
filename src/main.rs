use clap::Parser;

use video_assistant::cli::{
    handle_config_action, load_config, run_generate, run_session, Args, Command,
};
use video_assistant::veo::{ApiKey, API_KEY_ENV};

/// Load .env file and check for the Veo API key
///
/// Does not override existing environment variables.
/// Prints a warning if no key is available.
fn load_env() {
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();

    if ApiKey::from_env().is_err() {
        eprintln!("Warning: {} environment variable not set.", API_KEY_ENV);
        eprintln!("         Video generation will be unavailable.");
        eprintln!("         Set {} in .env or environment to enable.\n", API_KEY_ENV);
    }
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();
}

fn run(args: Args) -> Result<(), String> {
    let config_path = args.config.as_deref();

    match args.command {
        Command::Config { action } => handle_config_action(action, config_path),
        Command::Generate(generate_args) => {
            let config = load_config(config_path)?;
            run_generate(generate_args, &config)
        }
        Command::Session => {
            let config = load_config(config_path)?;
            run_session(&config)
        }
    }
}

fn main() {
    let args = Args::parse();

    init_logging();
    if !matches!(args.command, Command::Config { .. }) {
        load_env();
    }

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
