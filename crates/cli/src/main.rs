use std::{
    path::{Path, PathBuf},
    process,
};

use clap::{Parser, Subcommand};
use stripeform_core::{ProviderConfig, StripeProvider};
use stripeform_driver_stripe::StripeClient;

mod files;
mod resource;

#[derive(Clone, Debug)]
pub struct Context {
    pub provider_config: ProviderConfig,
}

impl Context {
    pub fn new(provider_config: ProviderConfig) -> Self {
        Context { provider_config }
    }

    /// Build a provider backed by the live Stripe API
    pub fn provider(&self) -> Result<StripeProvider<StripeClient>, String> {
        StripeProvider::configure(self.provider_config.clone()).map_err(|e| e.to_string())
    }
}

#[derive(Parser, Debug)]
#[clap(author, version, about = "Stripeform - manage Stripe billing objects as declarative resources", long_about = None)]
struct Opts {
    /// Path to the provider configuration file (default: ./stripeform.yaml)
    #[arg(
        long = "provider-config",
        short = 'p',
        global = true,
        default_value = "./stripeform.yaml"
    )]
    provider_config: PathBuf,

    /// Stripe API key. Overrides the provider file and STRIPE_API_TOKEN
    #[arg(long = "api-token", short = 'k', global = true)]
    api_token: Option<String>,

    /// Env file to load (default: .env next to the provider file)
    #[arg(long = "env-file", global = true)]
    env_file: Option<PathBuf>,

    /// Stripe API base URL, e.g. a local stripe-mock
    #[arg(long = "api-base", global = true)]
    api_base: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, PartialEq, Clone, Debug)]
enum Command {
    /// Print the provider and resource schemas as JSON
    Schema,
    /// Show what applying a configuration would change
    Plan(resource::PlanCommand),
    /// Create, update or replace a resource so it matches its configuration
    Apply(resource::ApplyCommand),
    /// Create a resource and write its state file
    Create(resource::CreateCommand),
    /// Refresh a state file from Stripe
    Read(resource::ReadCommand),
    /// Update a resource in place
    Update(resource::UpdateCommand),
    /// Delete a resource and remove its state file
    Delete(resource::DeleteCommand),
    /// Adopt an existing Stripe object by ID
    Import(resource::ImportCommand),
}

#[tokio::main]
async fn main() {
    let opts: Opts = match Opts::try_parse() {
        Ok(opts) => opts,
        Err(e) => {
            let _ = e.print();
            process::exit(e.exit_code());
        }
    };

    init_tracing();

    let env_file = opts.env_file.clone().unwrap_or_else(|| {
        opts.provider_config
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(".env")
    });
    load_env_file(&env_file);

    let mut provider_config = match files::load_provider_config(&opts.provider_config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    };
    if opts.api_token.is_some() {
        provider_config.api_token = opts.api_token.clone();
    }
    if opts.api_base.is_some() {
        provider_config.api_base = opts.api_base.clone();
    }

    tracing::debug!(?provider_config, "Loaded provider configuration");
    let ctx = Context::new(provider_config);

    if let Err(e) = handle_command(opts, &ctx).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

/// Export the variables of a dotenv file, typically `STRIPE_API_TOKEN`.
/// Returns whether the file existed and was loaded.
fn load_env_file(env_file: &Path) -> bool {
    match dotenvy::from_path(env_file) {
        Ok(()) => {
            tracing::info!(path = %env_file.display(), "Loaded env file");
            true
        }
        Err(e) if e.not_found() => {
            tracing::debug!(path = %env_file.display(), "No env file");
            false
        }
        Err(e) => {
            tracing::warn!(path = %env_file.display(), error = %e, "Ignoring unreadable env file");
            false
        }
    }
}

async fn handle_command(opts: Opts, ctx: &Context) -> Result<(), String> {
    if let Command::Schema = opts.command {
        return resource::print_schema().map_err(|e| format!("{:#}", e));
    }

    let provider = ctx.provider()?;
    let result = match opts.command {
        Command::Schema => Ok(()),
        Command::Plan(cmd) => cmd.execute(&provider),
        Command::Apply(cmd) => cmd.execute(&provider).await,
        Command::Create(cmd) => cmd.execute(&provider).await,
        Command::Read(cmd) => cmd.execute(&provider).await,
        Command::Update(cmd) => cmd.execute(&provider).await,
        Command::Delete(cmd) => cmd.execute(&provider).await,
        Command::Import(cmd) => cmd.execute(&provider).await,
    };
    result.map_err(|e| format!("{:#}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plan_command() {
        let opts = Opts::try_parse_from([
            "stripeform",
            "-k",
            "sk_test_123",
            "plan",
            "stripe_coupon",
            "--config",
            "coupon.yaml",
            "--state",
            "coupon.state.json",
        ])
        .unwrap();

        assert_eq!(opts.api_token.as_deref(), Some("sk_test_123"));
        assert_eq!(opts.provider_config, PathBuf::from("./stripeform.yaml"));
        let Command::Plan(cmd) = opts.command else {
            panic!("expected plan command");
        };
        assert_eq!(cmd.resource_type, "stripe_coupon");
        assert_eq!(cmd.state, Some(PathBuf::from("coupon.state.json")));
    }

    #[test]
    fn test_load_env_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let env_file = temp_dir.path().join(".env");
        assert!(!load_env_file(&env_file));

        std::fs::write(&env_file, "STRIPEFORM_TEST_ENV_FILE_TOKEN=sk_test_from_env_file\n").unwrap();
        assert!(load_env_file(&env_file));
        assert_eq!(
            std::env::var("STRIPEFORM_TEST_ENV_FILE_TOKEN").as_deref(),
            Ok("sk_test_from_env_file")
        );
    }

    #[test]
    fn test_import_requires_id() {
        let err = Opts::try_parse_from([
            "stripeform",
            "import",
            "stripe_product",
            "--state",
            "product.json",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
