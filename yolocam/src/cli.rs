//! Command-line argument parsing for both binaries, in the style of
//! `strand-cam`'s `cli_app.rs`.

use clap::{Parser, Subcommand};

/// Long-running LPR appliance process.
#[derive(Debug, Clone, Parser)]
#[command(name = "yolocam-agent", about = "YOLOCAM license-plate recognition appliance")]
pub struct AgentArgs {
    /// Recognition-engine auth token.
    #[arg(short = 't', long, env = "YOLOCAM_TOKEN")]
    pub token: String,

    /// Recognition-engine license key.
    #[arg(short = 'l', long, env = "YOLOCAM_LICENSE")]
    pub license: Option<String>,

    /// Recognition-engine address, e.g. `127.0.0.1:8100`.
    #[arg(short = 'a', long, env = "YOLOCAM_ADDRESS")]
    pub address: String,

    /// Root directory for config, outboxes, and lists.
    #[arg(long, env = "YOLOCAM_DATA_DIR", default_value = "~/.yolocam")]
    pub data_dir: String,

    /// Run without a physical GPIO/I2C board (bench testing).
    #[arg(long)]
    pub no_gpio: bool,
}

/// One-shot operator tool driving the recognition-engine container.
#[derive(Debug, Clone, Parser)]
#[command(name = "yolocam-installer", about = "Install/update/uninstall the recognition-engine container")]
pub struct InstallerArgs {
    #[arg(short = 't', long, env = "YOLOCAM_TOKEN")]
    pub token: String,

    #[arg(short = 'l', long, env = "YOLOCAM_LICENSE")]
    pub license: Option<String>,

    #[command(subcommand)]
    pub action: InstallerAction,
}

#[derive(Debug, Clone, Subcommand)]
pub enum InstallerAction {
    /// Pull and run the recognition-engine image.
    Install,
    /// Stop and remove the recognition-engine container.
    Uninstall,
    /// Pull the latest image, stop the old container, and reinstall.
    Update,
}
