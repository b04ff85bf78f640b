//! Subcommand handlers for generate, session and config actions.

use std::path::Path;
use std::time::Duration;

use super::args::{ConfigAction, GenerateArgs};
use crate::config::{default_path as get_config_path, Config};
use crate::prompt::{SessionCommand, SessionInput, HELP_TEXT};
use crate::session::Session;
use crate::veo::{ApiKey, PollPolicy, VeoClient, API_KEY_ENV};

fn missing_key_help() -> String {
    format!(
        "{} environment variable is not set.\n\n\
        Add your API key to a .env file:\n\
            echo '{}=your-api-key-here' >> .env\n\n\
        Or set it as an environment variable:\n\
            export {}=\"your-api-key-here\"\n\n\
        Get your API key at: https://aistudio.google.com/apikey",
        API_KEY_ENV, API_KEY_ENV, API_KEY_ENV
    )
}

fn create_client(config: &Config) -> Result<VeoClient, String> {
    let api_key = ApiKey::from_env().map_err(|_| missing_key_help())?;
    VeoClient::from_config(config, api_key)
        .map_err(|e| format!("Failed to create Veo client: {}", e))
}

fn create_runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Runtime::new().map_err(|e| format!("Failed to create async runtime: {}", e))
}

/// Load the configuration.
///
/// An explicit path must exist and parse. The default path falls back to
/// built-in defaults with a warning when the file is unreadable.
pub fn load_config(path: Option<&Path>) -> Result<Config, String> {
    match path {
        Some(path) => Config::load_from_explicit(path).map_err(|e| e.to_string()),
        None => match Config::load(None) {
            Ok(config) => Ok(config),
            Err(e) => {
                eprintln!("Warning: Failed to load config file: {}", e);
                eprintln!("Using default settings.\n");
                Ok(Config::default())
            }
        },
    }
}

/// Poll policy from config, with command-line overrides applied.
fn poll_policy(config: &Config, args: &GenerateArgs) -> PollPolicy {
    let mut policy = config.polling.to_policy();
    if let Some(secs) = args.poll_interval {
        policy.interval = Duration::from_secs(secs.max(1));
    }
    if let Some(max) = args.max_poll_failures {
        policy.max_consecutive_failures = Some(max).filter(|m| *m > 0);
    }
    policy
}

/// Fill a fresh session from command-line arguments.
fn session_from_args(config: &Config, args: &GenerateArgs) -> Result<Session, String> {
    let mut session = Session::new(config.defaults.clone());
    session.prompt = args.prompt.clone();
    session.voice_text = args.voice.clone().unwrap_or_default();
    if args.no_watermark {
        session.watermark.clear();
    } else if let Some(watermark) = &args.watermark {
        session.watermark = watermark.clone();
    }
    if let Some(ratio) = args.aspect_ratio {
        session.aspect_ratio = ratio.into();
    }
    if let Some(image) = &args.image {
        session.set_reference_image(image, args.image_mime.clone())?;
    }
    Ok(session)
}

/// Run the generate command: one generation, result saved to disk.
pub fn run_generate(args: GenerateArgs, config: &Config) -> Result<(), String> {
    let mut session = session_from_args(config, &args)?;
    if !session.can_submit() {
        return Err(crate::veo::EMPTY_PROMPT_MESSAGE.to_string());
    }

    let client = create_client(config)?;
    let policy = poll_policy(config, &args);
    let dest_dir = args
        .output
        .clone()
        .unwrap_or_else(|| config.defaults.output_dir());

    println!("Generating video for: \"{}\"", session.prompt);
    println!();

    let rt = create_runtime()?;
    let video = rt.block_on(session.generate(
        &client,
        &policy,
        &dest_dir,
        SessionInput::print_loading,
    ))?;

    SessionInput::print_video_ready(&video.path);
    Ok(())
}

/// Run the interactive session until `/quit` or end of input.
pub fn run_session(config: &Config) -> Result<(), String> {
    let client = create_client(config)?;
    let policy = config.polling.to_policy();
    let rt = create_runtime()?;
    let mut session = Session::new(config.defaults.clone());

    println!("AI Video Generation Assistant");
    println!();
    println!("{}", HELP_TEXT);
    println!();

    let (_input, rx) = SessionInput::spawn_listener();
    SessionInput::print_prompt();

    while let Ok(command) = rx.recv() {
        match command {
            SessionCommand::SetPrompt(prompt) => {
                session.prompt = prompt;
                SessionInput::print_status("Prompt set.");
            }
            SessionCommand::SetVoice(voice) => {
                session.voice_text = voice;
                SessionInput::print_status("Voice text updated.");
            }
            SessionCommand::SetWatermark(watermark) => {
                session.watermark = watermark;
                SessionInput::print_status("Watermark updated.");
            }
            SessionCommand::SetImage { path, mime } => {
                match session.set_reference_image(path, mime) {
                    Ok(()) => SessionInput::print_status("Reference image selected."),
                    Err(e) => SessionInput::print_error(&e),
                }
            }
            SessionCommand::ClearImage => {
                session.clear_reference_image();
                SessionInput::print_status("Reference image removed.");
            }
            SessionCommand::SetAspectRatio(ratio) => {
                session.aspect_ratio = ratio;
                SessionInput::print_status(&format!("Aspect ratio set to {}.", ratio));
            }
            SessionCommand::Show => SessionInput::print_status(&session.summary()),
            SessionCommand::Generate => {
                let dest_dir = session.output_dir();
                let outcome = rt.block_on(session.generate(
                    &client,
                    &policy,
                    &dest_dir,
                    SessionInput::print_loading,
                ));
                match outcome {
                    Ok(video) => SessionInput::print_video_ready(&video.path),
                    Err(message) => SessionInput::print_error(&message),
                }

                let pending = SessionInput::drain_pending(&rx);
                if pending.ignored > 0 {
                    SessionInput::print_ignored_while_loading(pending.ignored);
                }
                if pending.quit_requested {
                    break;
                }
            }
            SessionCommand::StartOver => {
                session.start_over();
                SessionInput::print_status("Form reset.");
            }
            SessionCommand::Help => SessionInput::print_status(HELP_TEXT),
            SessionCommand::Quit => break,
        }
        SessionInput::print_prompt();
    }

    println!();
    Ok(())
}

/// Handle config subcommand actions.
pub fn handle_config_action(action: ConfigAction, path: Option<&Path>) -> Result<(), String> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(get_config_path);

    match action {
        ConfigAction::Show => {
            let config = load_config(path)?;
            println!("Current configuration:");
            println!();
            println!("{}", config.to_toml().map_err(|e| e.to_string())?);

            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found)", config_path.display());
            }
            Ok(())
        }
        ConfigAction::Init => {
            Config::write_default(&config_path).map_err(|e| {
                format!(
                    "{}\nUse 'video-assistant config show' to view current settings.",
                    e
                )
            })?;
            println!("Created config file: {}", config_path.display());
            Ok(())
        }
    }
}
