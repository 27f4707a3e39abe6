//! One-shot operator tool driving the recognition-engine container
//! lifecycle via the local Docker daemon.

use clap::Parser;

use yolocam::cli::{InstallerAction, InstallerArgs};
use yolocam::installer;

fn main() -> anyhow::Result<()> {
    let _logger = yolocam::logging::init();
    let args = InstallerArgs::parse();

    match args.action {
        InstallerAction::Install => installer::install(&args.token, args.license.as_deref()),
        InstallerAction::Uninstall => installer::uninstall(&args.token),
        InstallerAction::Update => installer::update(&args.token, args.license.as_deref()),
    }
}
