use clap::Parser;

mod cli;
mod config;
mod gateways;
mod report;
mod session;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    cli::run(cli::Cli::parse())
}
