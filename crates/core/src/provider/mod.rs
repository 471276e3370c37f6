//! Provider registry.
//!
//! [`StripeProvider`] owns the configured client and routes each operation
//! to the resource registered under the requested type name. It also owns the
//! configuration-side steps every operation shares: defaults, schema
//! validation and change planning.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use stripeform_driver_stripe::{StripeApi, StripeClient};
use stripeform_types::{ProviderSchema, ResourceData, ResourceState};

use crate::{
    config::ProviderConfig,
    error::{ProviderError, Result},
    resources::ResourceKind,
};

/// What applying a configuration would do to a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanAction {
    Create,
    Update,
    Replace,
    NoOp,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanResult {
    pub resource_type: String,
    pub action: PlanAction,
    pub changed: Vec<String>,
    pub requires_replace: Vec<String>,
}

pub struct StripeProvider<C> {
    client: C,
}

impl StripeProvider<StripeClient> {
    /// Resolve `config` against the environment and build a live client
    pub fn configure(config: ProviderConfig) -> Result<Self> {
        let client = config.resolve().client()?;
        Ok(Self::new(client))
    }
}

impl<C: StripeApi> StripeProvider<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Provider configuration schema plus every resource schema
    pub fn schema() -> ProviderSchema {
        ResourceKind::ALL.iter().fold(
            ProviderSchema::new(ProviderConfig::schema()),
            |schema, kind| schema.with_resource(kind.type_name(), kind.schema()),
        )
    }

    /// Apply defaults and check `config` against the resource schema
    fn prepare(kind: ResourceKind, mut config: IndexMap<String, Value>) -> Result<IndexMap<String, Value>> {
        let schema = kind.schema();
        schema.apply_defaults(&mut config);
        let warnings = schema.validate(&config).into_result()?;
        for warning in warnings {
            tracing::warn!(resource_type = %kind, "{}", warning);
        }
        Ok(config)
    }

    /// Work out what applying `config` over `prior` would do.
    /// A missing prior state, or one without an ID, plans a create.
    pub fn plan(
        &self,
        resource_type: &str,
        prior: Option<&ResourceState>,
        config: IndexMap<String, Value>,
    ) -> Result<PlanResult> {
        let kind = ResourceKind::from_type_name(resource_type)?;
        let config = Self::prepare(kind, config)?;

        let Some(prior) = prior.filter(|p| p.id.is_some()) else {
            return Ok(PlanResult {
                resource_type: resource_type.to_string(),
                action: PlanAction::Create,
                changed: config
                    .iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, _)| k.clone())
                    .collect(),
                requires_replace: Vec::new(),
            });
        };

        let schema = kind.schema();
        let changed = schema.diff(&prior.attributes, &config);
        let d = ResourceData::with_prior(prior.clone(), config);
        let mut requires_replace = schema.requires_replace(&changed);
        for name in kind.customize_diff(&d, &changed) {
            if !requires_replace.contains(&name) {
                requires_replace.push(name);
            }
        }

        let action = if changed.is_empty() {
            PlanAction::NoOp
        } else if requires_replace.is_empty() {
            PlanAction::Update
        } else {
            PlanAction::Replace
        };
        Ok(PlanResult {
            resource_type: resource_type.to_string(),
            action,
            changed,
            requires_replace,
        })
    }

    pub async fn create(
        &self,
        resource_type: &str,
        config: IndexMap<String, Value>,
    ) -> Result<ResourceState> {
        let kind = ResourceKind::from_type_name(resource_type)?;
        let mut d = ResourceData::new(Self::prepare(kind, config)?);
        kind.create(&self.client, &mut d).await?;
        Ok(d.into_state())
    }

    pub async fn read(&self, resource_type: &str, state: ResourceState) -> Result<ResourceState> {
        let kind = ResourceKind::from_type_name(resource_type)?;
        let mut d = ResourceData::from_state(state);
        kind.read(&self.client, &mut d).await?;
        Ok(d.into_state())
    }

    /// Update in place. Fails without any request when a changed attribute
    /// can only be applied by replacing the resource.
    pub async fn update(
        &self,
        resource_type: &str,
        prior: ResourceState,
        config: IndexMap<String, Value>,
    ) -> Result<ResourceState> {
        let plan = self.plan(resource_type, Some(&prior), config.clone())?;
        if !plan.requires_replace.is_empty() {
            return Err(ProviderError::RequiresReplacement(plan.requires_replace));
        }
        if prior.id.is_none() {
            return Err(ProviderError::MissingId(
                ResourceKind::from_type_name(resource_type)?.type_name(),
            ));
        }

        let kind = ResourceKind::from_type_name(resource_type)?;
        let mut d = ResourceData::with_prior(prior, Self::prepare(kind, config)?);
        kind.update(&self.client, &mut d).await?;
        Ok(d.into_state())
    }

    /// Delete the remote object. On failure the caller's state, ID
    /// included, stays valid.
    pub async fn delete(&self, resource_type: &str, state: ResourceState) -> Result<()> {
        let kind = ResourceKind::from_type_name(resource_type)?;
        let mut d = ResourceData::from_state(state);
        kind.delete(&self.client, &mut d).await
    }

    /// Adopt an existing remote object by ID
    pub async fn import(&self, resource_type: &str, id: &str) -> Result<ResourceState> {
        let kind = ResourceKind::from_type_name(resource_type)?;
        let mut d = ResourceData::with_id(id);
        kind.read(&self.client, &mut d).await?;
        tracing::info!(resource_type = %kind, id, "Imported resource");
        Ok(d.into_state())
    }

    /// Plan, then carry out the plan. A no-op plan returns the prior state
    /// without contacting Stripe.
    pub async fn apply(
        &self,
        resource_type: &str,
        prior: Option<ResourceState>,
        config: IndexMap<String, Value>,
    ) -> Result<(PlanResult, ResourceState)> {
        let plan = self.plan(resource_type, prior.as_ref(), config.clone())?;
        let state = match (plan.action, prior) {
            (PlanAction::Create, _) | (_, None) => self.create(resource_type, config).await?,
            (PlanAction::NoOp, Some(prior)) => prior,
            (PlanAction::Update, Some(prior)) => self.update(resource_type, prior, config).await?,
            (PlanAction::Replace, Some(prior)) => {
                tracing::info!(
                    resource_type,
                    id = ?prior.id,
                    attributes = ?plan.requires_replace,
                    "Replacing resource"
                );
                self.delete(resource_type, prior).await?;
                self.create(resource_type, config).await?
            }
        };
        Ok((plan, state))
    }
}
