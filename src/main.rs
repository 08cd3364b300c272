//! BugReport App Tester
//!
//! Automates the mundane steps of testing the BugReport app; a human still
//! has to record audio and press *Submit* when prompted.

use bugreport_tester::{cli, common::logging};
use clap::Parser;
use colored::Colorize;

#[derive(Parser)]
#[command(name = "bugreport-app-tester", about = "BugReport App Tester.")]
#[command(version, long_about = None)]
struct Cli {
    /// Use device with given serial
    #[arg(short = 's', value_name = "SERIAL")]
    serial: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    logging::init_cli();

    let cli = Cli::parse();

    if let Err(e) = cli::run(cli.serial).await {
        println!("{}", format!("\n{e}").red());
        std::process::exit(1);
    }
}
