//! Just `main()`. Keep as small as possible.

pub mod cli_args;
pub mod config;
pub mod input;
pub mod renderer;
pub mod run;
pub mod terminal_surface;

use color_eyre::eyre::Result;

/// Return the user's terminal to a clean state.
const RESET_SCREEN: &str = "\x1b[0m\x1b[?25h";

#[expect(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "It's our central place for communicating with the user on CLI"
)]
#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let outcome = run::run().await;
    println!("{RESET_SCREEN}");
    tracing::debug!("Particle Term is exiting");

    match outcome {
        Ok(logging) => {
            if let Some(path) = logging {
                println!("Logs saved to {}", path.display());
            }
        }
        Err(error) => {
            tracing::error!("{error:?}");
            eprintln!("Error: {error}");
        }
    }

    Ok(())
}
