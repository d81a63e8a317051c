//! Integration resolution for resource creation.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::platform::IntegrationClient;
use crate::report::Reporter;
use crate::resource::{InlineIntegration, IntegrationRequirement, IntegrationSpec, ResourceSpec};

/// How a resource obtains its integration, decided without network access.
#[derive(Debug, Clone, PartialEq)]
pub enum IntegrationPlan {
    /// Kind takes no integration, or an optional one was not supplied.
    None,
    /// Attach an existing integration by name.
    Reference(String),
    /// Create this integration, then attach it.
    Create(IntegrationSpec),
}

impl IntegrationPlan {
    /// Check a spec's integration fields against its kind.
    pub fn for_spec(spec: &ResourceSpec) -> Result<Self> {
        let descriptor = spec.kind.descriptor();
        let reference = spec
            .integration_ref
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());

        if reference.is_some() && spec.inline_integration.is_some() {
            return Err(Error::Validation(
                "specify either integrationRef or integrationType, not both".into(),
            ));
        }

        if descriptor.integration == IntegrationRequirement::Unsupported {
            if reference.is_some() || spec.inline_integration.is_some() {
                return Err(Error::Validation(format!(
                    "{} resources do not take an integration",
                    spec.kind
                )));
            }
            return Ok(Self::None);
        }

        if let Some(reference) = reference {
            return Ok(Self::Reference(reference.to_string()));
        }

        match &spec.inline_integration {
            Some(inline) => Self::inline(spec, inline).map(Self::Create),
            None if descriptor.integration == IntegrationRequirement::Required => {
                Err(Error::Validation(format!(
                    "must provide either integrationRef or integrationType to create {} '{}'",
                    spec.kind, spec.name
                )))
            }
            None => Ok(Self::None),
        }
    }

    fn inline(spec: &ResourceSpec, inline: &InlineIntegration) -> Result<IntegrationSpec> {
        let integration_type = inline.integration_type.trim();
        if integration_type.is_empty() {
            return Err(Error::Validation(
                "integrationType is required when creating an integration inline".into(),
            ));
        }

        if let Some(key) = spec.kind.descriptor().required_secret {
            let present = inline.secrets.get(key).is_some_and(|v| !v.trim().is_empty());
            if !present {
                return Err(Error::Validation(
                    "api key is required when specifying provider".into(),
                ));
            }
        }

        Ok(IntegrationSpec {
            name: IntegrationSpec::synthesized_name(&spec.name, integration_type),
            integration_type: integration_type.to_string(),
            secrets: inline.secrets.clone(),
            config: inline.config.clone(),
        })
    }
}

/// Resolves the integration a new resource should reference.
pub struct IntegrationResolver {
    client: Arc<dyn IntegrationClient>,
    reporter: Arc<dyn Reporter>,
}

impl IntegrationResolver {
    pub fn new(client: Arc<dyn IntegrationClient>, reporter: Arc<dyn Reporter>) -> Self {
        Self { client, reporter }
    }

    /// Resolve the integration name to attach, creating it if requested.
    ///
    /// References are returned unchanged; the platform validates them when
    /// the resource is created. An inline integration that already exists is
    /// reused under its synthesized name.
    pub async fn resolve(&self, spec: &ResourceSpec) -> Result<Option<String>> {
        match IntegrationPlan::for_spec(spec)? {
            IntegrationPlan::None => Ok(None),
            IntegrationPlan::Reference(name) => Ok(Some(name)),
            IntegrationPlan::Create(integration) => {
                match self.client.create_integration(&integration).await {
                    Ok(()) => {
                        self.reporter.milestone(&format!(
                            "created {} integration '{}' for {} '{}'",
                            integration.integration_type, integration.name, spec.kind, spec.name
                        ));
                    }
                    Err(e) if e.is_conflict() => {
                        self.reporter.warning(&format!(
                            "integration '{}' already exists, reusing it for {} '{}'",
                            integration.name, spec.kind, spec.name
                        ));
                    }
                    Err(e) => {
                        return Err(Error::platform(
                            format!("create integration '{}'", integration.name),
                            e,
                        ));
                    }
                }
                Ok(Some(integration.name))
            }
        }
    }
}
