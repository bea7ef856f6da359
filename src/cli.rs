use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "imglinker")]
#[command(author, version, about = "Telegram bot that re-uploads photos to image hosts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot
    Run {
        /// Use webhook mode instead of long polling
        #[arg(long)]
        webhook: bool,
    },

    /// Register PUBLIC_URL/<token> as the bot's webhook and exit
    SetWebhook,

    /// Remove the bot's webhook and exit
    DeleteWebhook,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
