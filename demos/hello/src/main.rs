use anyhow::Result;
use clap::{Parser, Subcommand};
use lantern::Config;

#[derive(Parser)]
#[command(name = "hello", about = "The minimal Lantern application")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the development server.
    Serve,
    /// Just say hello.
    Hello,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Hello => {
            println!("{}", hello_demo::HELLO_MESSAGE);
        }
        Command::Serve => {
            lantern::logging::init();
            let config = Config::load()?;
            let addr = config.addr()?;
            tracing::info!("Running on http://{}/", addr);
            hello_demo::app().listen(addr).await?;
        }
    }
    Ok(())
}
