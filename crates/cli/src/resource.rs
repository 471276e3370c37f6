use std::path::PathBuf;

use clap::Parser;
use stripeform_core::{PlanAction, StripeProvider};
use stripeform_driver_stripe::{StripeApi, StripeClient};
use stripeform_types::ResourceState;

use crate::files::{
    load_resource_config, load_state, remove_state, require_state, save_state,
};

pub fn print_schema() -> anyhow::Result<()> {
    let schema = StripeProvider::<StripeClient>::schema();
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn print_state(state: &ResourceState) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(state)?);
    Ok(())
}

fn id_of(state: &ResourceState) -> &str {
    state.id.as_deref().unwrap_or("<none>")
}

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct PlanCommand {
    /// Resource type, e.g. stripe_price
    pub resource_type: String,

    /// Desired attribute values (YAML or JSON)
    #[arg(long = "config", short = 'c')]
    pub config: PathBuf,

    /// Current state file. Without one the plan is a create
    #[arg(long = "state", short = 's')]
    pub state: Option<PathBuf>,
}

impl PlanCommand {
    pub fn execute<C: StripeApi>(&self, provider: &StripeProvider<C>) -> anyhow::Result<()> {
        let config = load_resource_config(&self.config)?;
        let prior = match &self.state {
            Some(path) => load_state(path)?,
            None => None,
        };
        let plan = provider.plan(&self.resource_type, prior.as_ref(), config)?;
        println!("{}", serde_json::to_string_pretty(&plan)?);
        Ok(())
    }
}

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct ApplyCommand {
    /// Resource type, e.g. stripe_price
    pub resource_type: String,

    /// Desired attribute values (YAML or JSON)
    #[arg(long = "config", short = 'c')]
    pub config: PathBuf,

    /// State file, created if missing
    #[arg(long = "state", short = 's')]
    pub state: PathBuf,
}

impl ApplyCommand {
    pub async fn execute<C: StripeApi>(&self, provider: &StripeProvider<C>) -> anyhow::Result<()> {
        let config = load_resource_config(&self.config)?;
        let prior = load_state(&self.state)?;
        let (plan, state) = provider.apply(&self.resource_type, prior, config).await?;
        match plan.action {
            PlanAction::NoOp => {
                eprintln!("✓ {} {} is up to date", self.resource_type, id_of(&state));
            }
            action => {
                save_state(&self.state, &state)?;
                eprintln!(
                    "✓ {:?} {} {}, state written to {}",
                    action,
                    self.resource_type,
                    id_of(&state),
                    self.state.display()
                );
            }
        }
        Ok(())
    }
}

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct CreateCommand {
    /// Resource type, e.g. stripe_price
    pub resource_type: String,

    /// Desired attribute values (YAML or JSON)
    #[arg(long = "config", short = 'c')]
    pub config: PathBuf,

    /// State file to write
    #[arg(long = "state", short = 's')]
    pub state: PathBuf,
}

impl CreateCommand {
    pub async fn execute<C: StripeApi>(&self, provider: &StripeProvider<C>) -> anyhow::Result<()> {
        if load_state(&self.state)?.is_some_and(|s| s.id.is_some()) {
            anyhow::bail!(
                "{} already tracks a resource; use update, apply or delete",
                self.state.display()
            );
        }
        let config = load_resource_config(&self.config)?;
        let state = provider.create(&self.resource_type, config).await?;
        save_state(&self.state, &state)?;
        eprintln!("✓ Created {} {}", self.resource_type, id_of(&state));
        Ok(())
    }
}

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct ReadCommand {
    /// Resource type, e.g. stripe_price
    pub resource_type: String,

    /// State file to refresh
    #[arg(long = "state", short = 's')]
    pub state: PathBuf,
}

impl ReadCommand {
    pub async fn execute<C: StripeApi>(&self, provider: &StripeProvider<C>) -> anyhow::Result<()> {
        let prior = require_state(&self.state)?;
        let state = provider.read(&self.resource_type, prior).await?;
        save_state(&self.state, &state)?;
        print_state(&state)
    }
}

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct UpdateCommand {
    /// Resource type, e.g. stripe_price
    pub resource_type: String,

    /// Desired attribute values (YAML or JSON)
    #[arg(long = "config", short = 'c')]
    pub config: PathBuf,

    /// State file of the resource to update
    #[arg(long = "state", short = 's')]
    pub state: PathBuf,
}

impl UpdateCommand {
    pub async fn execute<C: StripeApi>(&self, provider: &StripeProvider<C>) -> anyhow::Result<()> {
        let prior = require_state(&self.state)?;
        let config = load_resource_config(&self.config)?;
        let state = provider.update(&self.resource_type, prior, config).await?;
        save_state(&self.state, &state)?;
        eprintln!("✓ Updated {} {}", self.resource_type, id_of(&state));
        Ok(())
    }
}

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct DeleteCommand {
    /// Resource type, e.g. stripe_price
    pub resource_type: String,

    /// State file of the resource to delete; removed on success
    #[arg(long = "state", short = 's')]
    pub state: PathBuf,
}

impl DeleteCommand {
    pub async fn execute<C: StripeApi>(&self, provider: &StripeProvider<C>) -> anyhow::Result<()> {
        let state = require_state(&self.state)?;
        let id = id_of(&state).to_string();
        provider.delete(&self.resource_type, state).await?;
        remove_state(&self.state)?;
        eprintln!("✓ Deleted {} {}", self.resource_type, id);
        Ok(())
    }
}

#[derive(Parser, PartialEq, Clone, Debug)]
pub struct ImportCommand {
    /// Resource type, e.g. stripe_price
    pub resource_type: String,

    /// Stripe ID of the existing object
    #[arg(long = "id")]
    pub id: String,

    /// State file to write
    #[arg(long = "state", short = 's')]
    pub state: PathBuf,
}

impl ImportCommand {
    pub async fn execute<C: StripeApi>(&self, provider: &StripeProvider<C>) -> anyhow::Result<()> {
        let state = provider.import(&self.resource_type, &self.id).await?;
        save_state(&self.state, &state)?;
        eprintln!("✓ Imported {} {}", self.resource_type, self.id);
        Ok(())
    }
}
