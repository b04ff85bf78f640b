//! SessionInput - interactive form input on stdin.
//!
//! Plain text sets the prompt; slash commands edit the other form fields and
//! trigger generation.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use crate::veo::AspectRatio;

/// Commands that can be sent through the session input channel.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// Replace the prompt.
    SetPrompt(String),
    /// Replace the voice-over text. Empty clears it.
    SetVoice(String),
    /// Replace the watermark text. Empty clears it.
    SetWatermark(String),
    /// Select a reference image, with an optional declared MIME type.
    SetImage {
        path: PathBuf,
        mime: Option<String>,
    },
    ClearImage,
    SetAspectRatio(AspectRatio),
    Show,
    Generate,
    /// Reset every field to its default.
    StartOver,
    Help,
    Quit,
}

pub const HELP_TEXT: &str = "\
Type a prompt and press enter to set it. Commands:
  /voice <text>            text the subject should say (empty clears)
  /watermark <text>        watermark text (empty clears)
  /image <path> [mime]     reference image (png, jpg, webp)
  /clear-image             remove the reference image
  /aspect <16:9|9:16>      output aspect ratio
  /show                    show the current form
  /generate                generate the video
  /reset                   start over with default values
  /help                    show this help
  /quit                    exit";

/// Input received while a generation was in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingInput {
    pub ignored: usize,
    pub quit_requested: bool,
}

/// Split `/image` arguments into a path and an optional trailing MIME type.
///
/// The path may contain spaces. The last word is taken as the MIME type only
/// when it looks like `image/...`, `video/...` and so on.
fn split_image_args(rest: &str) -> (&str, Option<&str>) {
    if let Some((path, last)) = rest.rsplit_once(char::is_whitespace) {
        let path = path.trim_end();
        if !path.is_empty() && looks_like_mime(last) {
            return (path, Some(last));
        }
    }
    (rest, None)
}

fn looks_like_mime(token: &str) -> bool {
    match token.split_once('/') {
        Some((top, sub)) => {
            matches!(
                top.to_ascii_lowercase().as_str(),
                "image" | "video" | "audio" | "text" | "application"
            ) && !sub.is_empty()
                && !sub.contains('/')
        }
        None => false,
    }
}

/// Interactive input handler for the generation form.
///
/// Reads stdin on a background thread and forwards parsed commands through
/// a channel so the caller can run generations without blocking input.
pub struct SessionInput {
    tx: mpsc::Sender<SessionCommand>,
}

impl SessionInput {
    /// Start listening for input on stdin.
    ///
    /// # Returns
    /// A tuple of the input handle and the receiver for parsed commands. The
    /// channel closes on EOF.
    pub fn spawn_listener() -> (Self, mpsc::Receiver<SessionCommand>) {
        let (tx, rx) = mpsc::channel();
        let tx_clone = tx.clone();

        thread::spawn(move || {
            let stdin = io::stdin();
            let handle = stdin.lock();

            for line in handle.lines() {
                match line {
                    Ok(input) => {
                        if let Some(cmd) = Self::parse_input(&input) {
                            if tx_clone.send(cmd).is_err() {
                                break;
                            }
                        }
                    }
                    Err(_) => break,
                }
            }
        });

        (Self { tx }, rx)
    }

    /// Parse a line of input into a SessionCommand.
    ///
    /// # Parsing Rules
    /// - Empty/whitespace-only input is ignored
    /// - `/command [args]` is parsed as a slash command
    /// - Any other text becomes `SetPrompt(text)`
    pub fn parse_input(input: &str) -> Option<SessionCommand> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return None;
        }

        if trimmed.starts_with('/') {
            return Self::parse_command(trimmed);
        }

        Some(SessionCommand::SetPrompt(trimmed.to_string()))
    }

    fn parse_command(input: &str) -> Option<SessionCommand> {
        let (name, rest) = match input.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (input, ""),
        };

        match name.to_lowercase().as_str() {
            "/voice" => Some(SessionCommand::SetVoice(rest.to_string())),
            "/watermark" => Some(SessionCommand::SetWatermark(rest.to_string())),
            "/image" => {
                if rest.is_empty() {
                    Self::print_status("Usage: /image <path> [mime-type]");
                    return None;
                }
                let (path, mime) = split_image_args(rest);
                Some(SessionCommand::SetImage {
                    path: PathBuf::from(path),
                    mime: mime.map(str::to_string),
                })
            }
            "/clear-image" => Some(SessionCommand::ClearImage),
            "/aspect" => match rest.parse::<AspectRatio>() {
                Ok(ratio) => Some(SessionCommand::SetAspectRatio(ratio)),
                Err(e) => {
                    Self::print_status(&e);
                    None
                }
            },
            "/show" => Some(SessionCommand::Show),
            "/generate" => Some(SessionCommand::Generate),
            "/reset" => Some(SessionCommand::StartOver),
            "/help" => Some(SessionCommand::Help),
            "/quit" | "/exit" => Some(SessionCommand::Quit),
            _ => {
                Self::print_status(&format!("Unknown command: {}", name));
                Self::print_status("Type /help for available commands.");
                None
            }
        }
    }

    /// Drain commands that arrived while a generation was running.
    ///
    /// Everything is dropped except a quit request, which is reported.
    pub fn drain_pending(rx: &mpsc::Receiver<SessionCommand>) -> PendingInput {
        rx.try_iter().fold(PendingInput::default(), |mut pending, cmd| {
            if cmd == SessionCommand::Quit {
                pending.quit_requested = true;
            } else {
                pending.ignored += 1;
            }
            pending
        })
    }

    /// Send a command programmatically (for testing or automation).
    pub fn send(&self, command: SessionCommand) -> Result<(), mpsc::SendError<SessionCommand>> {
        self.tx.send(command)
    }

    /// Print the input prompt.
    pub fn print_prompt() {
        print!("> ");
        let _ = io::stdout().flush();
    }

    pub fn print_status(message: &str) {
        println!("{}", message);
    }

    /// Print a rotating loading message on a single, rewritten line.
    pub fn print_loading(message: &str) {
        print!("\r\x1b[2K{}", message);
        let _ = io::stdout().flush();
    }

    pub fn print_video_ready(path: &std::path::Path) {
        println!();
        Self::print_status("Your video is ready!");
        Self::print_status(&format!("  Path: {}", path.display()));
        Self::print_status("Type /reset to create another video.");
    }

    pub fn print_error(message: &str) {
        println!();
        Self::print_status(&format!("Error: {}", message));
    }

    pub fn print_ignored_while_loading(count: usize) {
        Self::print_status(&format!(
            "Ignored {} input(s) received while generating.",
            count
        ));
    }
}
