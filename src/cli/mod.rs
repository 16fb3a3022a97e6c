use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "audiograb",
    about = "audiograb - search YouTube and download the audio of a video",
    version,
    long_about = "Interactive CLI that searches YouTube, lists the matching videos with their views and like ratio, \
lets you pick an audio rendition and downloads it with yt-dlp. The \"fastest\" mode downloads the full stream and converts it to mp3 with ffmpeg."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// YouTube Data API key (prompted for when neither this nor the config file provides one)
    #[arg(long, env = "AUDIOGRAB_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Search query (prompted for when omitted)
    #[arg(short = 's', long, value_name = "TEXT")]
    pub query: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the configuration file and its location
    Config {
        /// Print the current settings
        #[arg(short, long)]
        show: bool,
    },

    /// Check that the downloader and transcoder are installed
    Check,
}
