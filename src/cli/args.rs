//! CLI argument parsing with clap.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use super::enums::Ratio;

/// AI video generation assistant powered by Veo
#[derive(Parser, Debug)]
#[command(name = "video-assistant")]
#[command(version, about = "Generate videos from text prompts with Veo", long_about = None)]
#[command(after_help = "EXAMPLES:
    # One-shot generation with the default watermark
    video-assistant generate \"A majestic lion walking on a beach at sunset\"

    # Portrait video with a spoken line and a reference image
    video-assistant generate \"A chef in a kitchen\" --voice \"Bon appetit!\" \\
        --image chef.jpg --aspect-ratio 9:16

    # Interactive form
    video-assistant session

ENVIRONMENT:
    GEMINI_API_KEY    Required. Your Google AI API key (API_KEY is also accepted).
    RUST_LOG          Log filter, e.g. RUST_LOG=video_assistant=debug")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate one video and save it locally
    Generate(GenerateArgs),
    /// Fill in the generation form interactively
    Session,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct GenerateArgs {
    /// Text prompt describing the video
    pub prompt: String,

    /// Text the subject should say, with synchronized lip movement
    #[arg(long)]
    pub voice: Option<String>,

    /// Watermark text for the bottom right corner (default from config)
    #[arg(long, conflicts_with = "no_watermark")]
    pub watermark: Option<String>,

    /// Do not request a watermark
    #[arg(long)]
    pub no_watermark: bool,

    /// Reference image (png, jpg or webp)
    #[arg(long, short)]
    pub image: Option<PathBuf>,

    /// MIME type of the reference image, overriding extension detection
    #[arg(long, requires = "image")]
    pub image_mime: Option<String>,

    /// Output aspect ratio (default from config)
    #[arg(long, short)]
    pub aspect_ratio: Option<Ratio>,

    /// Directory the video is saved to (default from config)
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Seconds between status polls
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Give up after this many consecutive failed polls
    #[arg(long)]
    pub max_poll_failures: Option<u32>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}
