//! Command-line interface for strictly_letters.

use clap::{Parser, Subcommand};

/// Strictly Letters - multiplayer word-board client
#[derive(Parser, Debug)]
#[command(name = "strictly_letters")]
#[command(about = "Play a shared word board against an authoritative game service", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum CliCommand {
    /// Join the game as the configured player
    Play {
        /// Path to the client config file (falls back to $STRICTLY_LETTERS_CONFIG,
        /// then ./strictly_letters.toml)
        #[arg(short, long)]
        config: Option<std::path::PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_takes_optional_config() {
        let cli = Cli::try_parse_from(["strictly_letters", "play", "--config", "me.toml"]).unwrap();
        match cli.command {
            CliCommand::Play { config } => {
                assert_eq!(config, Some(std::path::PathBuf::from("me.toml")));
            }
        }
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["strictly_letters"]).is_err());
    }
}
