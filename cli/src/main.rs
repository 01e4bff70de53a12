//! provision-basebox - turn a fresh Ubuntu VM into a Vagrant base box

use std::time::Duration;

use basebox_provisioner::cli::Cli;
use basebox_provisioner::domain::RunOutcome;
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let outcome = cli.run().await;
    match &outcome {
        RunOutcome::Finished(Ok(())) => {}
        RunOutcome::Finished(Err(e)) => eprintln!("Error: {e:?}"),
        RunOutcome::Interrupted(signal) => {
            println!("Got {signal}, terminating");
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }
    std::process::exit(outcome.exit_code());
}
