// ragdesk
// Terminal client for a RAG backend: index codebases and logs, run analyses
// and ask questions about them.
//
// Run with: cargo run --bin ragdesk -- --help
// Or install: cargo install --path crates/ragdesk-cli

mod cli;

use clap::Parser;

use cli::args::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    cli::init_logging(args.verbose);
    cli::run(args).await
}
