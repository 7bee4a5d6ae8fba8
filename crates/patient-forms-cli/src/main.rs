mod cli;
mod commands;
mod config;
mod observability;
mod output;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use patient_forms_core::FhirClient;

use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing(&cli.log_level);

    let profile = &cli.profile;
    let cfg = config::load_profile(profile)?;
    let format = cli.format.or_else(|| cfg.output_format()).unwrap_or_default();

    match &cli.command {
        Commands::Config(args) => run_config(args, profile, cfg.clone())?,
        Commands::Create(args) => {
            let client = make_client(&cli.server, &cfg);
            commands::crud::create(&client, args, format).await?;
        }
        Commands::Show(args) => {
            let client = make_client(&cli.server, &cfg);
            commands::crud::show(&client, &args.id, format).await?;
        }
        Commands::Update(args) => {
            let client = make_client(&cli.server, &cfg);
            commands::crud::update(&client, &args.id, &args.fields, format).await?;
        }
        Commands::Delete(args) => {
            let client = make_client(&cli.server, &cfg);
            commands::crud::delete(&client, &args.id).await?;
        }
        Commands::Search(args) => {
            let client = make_client(&cli.server, &cfg);
            commands::search::search(&client, args, format).await?;
        }
    }

    Ok(())
}

fn make_client(cli_server: &Option<String>, cfg: &config::ProfileConfig) -> FhirClient {
    let server = config::resolve_server(cli_server, cfg);
    tracing::debug!(%server, "using FHIR server");
    FhirClient::new(&server)
}

fn run_config(args: &cli::ConfigArgs, profile: &str, mut cfg: config::ProfileConfig) -> Result<()> {
    match &args.command {
        cli::ConfigCommands::Show => {
            println!("{}: {}", "Profile".cyan(), profile);
            println!(
                "{}: {}",
                "Server".cyan(),
                cfg.server.as_deref().unwrap_or("(not set)")
            );
            println!(
                "{}: {}",
                "Format".cyan(),
                cfg.format.as_deref().unwrap_or("table")
            );
        }
        cli::ConfigCommands::Set(set_args) => {
            cfg.set(&set_args.key, &set_args.value)?;
            config::save_profile(profile, &cfg)?;
            output::print_success(&format!("Set {} = {}", set_args.key, set_args.value));
        }
    }
    Ok(())
}
