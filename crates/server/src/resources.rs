//! Core resources: resolved config, health, and per-index details.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::InvocationContext;
use crate::error::{Result, ServerError};
use crate::registry::{ComponentEntry, ComponentMetadata, Origin, ResourceHandler};

/// `splunk://config`: the config resolved for this caller, secrets
/// redacted, with the per-field source map.
struct ConfigResource;

#[async_trait]
impl ResourceHandler for ConfigResource {
    async fn read(
        &mut self,
        ctx: &InvocationContext,
        _binding: HashMap<String, String>,
    ) -> Result<Value> {
        let config = &ctx.config;
        Ok(json!({
            "host": config.host,
            "port": config.port(),
            "scheme": config.scheme().as_str(),
            "username": config.username,
            "password_set": config.password.is_some(),
            "token_set": config.token.is_some(),
            "verify_tls": config.verify_tls(),
            "app": config.app,
            "usable": config.is_usable(),
            "source_map": ctx.source_map.to_json(),
        }))
    }
}

/// `splunk://health`: the splunkd health report.
struct HealthResource;

#[async_trait]
impl ResourceHandler for HealthResource {
    async fn read(
        &mut self,
        ctx: &InvocationContext,
        _binding: HashMap<String, String>,
    ) -> Result<Value> {
        let session = ctx.pool.acquire(&ctx.config).await?;
        let report = session.client().await.health().await?;
        ctx.pool.release(&session);
        Ok(json!({
            "health": report.health,
            "features": report.features,
        }))
    }
}

/// `splunk://indexes/{name}`: details of one index.
struct IndexResource;

#[async_trait]
impl ResourceHandler for IndexResource {
    async fn read(
        &mut self,
        ctx: &InvocationContext,
        binding: HashMap<String, String>,
    ) -> Result<Value> {
        let name = binding
            .get("name")
            .ok_or_else(|| ServerError::Internal("missing 'name' binding".to_string()))?;

        let session = ctx.pool.acquire(&ctx.config).await?;
        let index = session.client().await.get_index(name).await?;
        ctx.pool.release(&session);
        serde_json::to_value(&index).map_err(|e| ServerError::Internal(e.to_string()))
    }
}

/// Core resource entries.
pub fn core_entries() -> Vec<ComponentEntry> {
    vec![
        ComponentEntry::resource(
            ComponentMetadata::new(
                "resolved_config",
                "The Splunk configuration resolved for this caller, with secrets \
                 redacted and the per-field source map",
                "system",
                false,
                Origin::Core,
                "resources.rs",
            )
            .with_uri("splunk://config"),
            || ConfigResource,
        ),
        ComponentEntry::resource(
            ComponentMetadata::new(
                "splunkd_health",
                "Current splunkd health report",
                "health",
                true,
                Origin::Core,
                "resources.rs",
            )
            .with_uri("splunk://health"),
            || HealthResource,
        ),
        ComponentEntry::resource(
            ComponentMetadata::new(
                "index_details",
                "Details of one index: event counts, sizes, and time bounds",
                "metadata",
                true,
                Origin::Core,
                "resources.rs",
            )
            .with_uri("splunk://indexes/{name}"),
            || IndexResource,
        ),
    ]
}
