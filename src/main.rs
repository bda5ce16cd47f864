use clap::Parser;
use evm_rpc_client::api::{Cli, CliHandler, Commands};
use evm_rpc_client::config::ClientConfig;
use evm_rpc_client::logging::{init_logging, ErrorLogger, LogContext};
use evm_rpc_client::ClientError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // A sample config must be printable even when the effective one is unusable
    if let Commands::Config { sample: true } = cli.command {
        match ClientConfig::generate_sample_config() {
            Ok(sample) => println!("{}", sample),
            Err(e) => fail(e.into()),
        }
        return;
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let handler = match CliHandler::new(config) {
        Ok(handler) => handler,
        Err(e) => fail(e),
    };

    match handler.execute_command(&cli.command).await {
        Ok(output) => println!("{}", output),
        Err(e) => fail(e),
    }
}

/// `.env`, config file and environment, then command-line flags
fn load_config(cli: &Cli) -> Result<ClientConfig, ClientError> {
    let mut config = ClientConfig::load_with_file(cli.config.as_deref())?;

    if let Some(endpoint) = &cli.endpoint {
        config.rpc.endpoint = endpoint.clone();
    }
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    config.validate()?;
    Ok(config)
}

fn fail(error: ClientError) -> ! {
    ErrorLogger::log_error(&error, Some(LogContext::new("cli", "main")));
    eprintln!("Error: {}", error);
    std::process::exit(1);
}
