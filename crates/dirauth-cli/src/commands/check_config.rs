//! Check-config command

use super::CommandContext;
use anyhow::{Context, Result};
use colored::Colorize;
use dirauth_core::{DirAuthConfig, ProviderKind};
use serde_json::{json, Value};

pub fn execute(ctx: &CommandContext) -> Result<()> {
    let summary = summarize(&ctx.config)?;

    if ctx.is_json() {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", "Configuration OK".green().bold());
    println!();
    if let Value::Object(fields) = &summary {
        for (name, value) in fields {
            match value {
                Value::String(s) => println!("{:<20} {}", format!("{}:", name).bold(), s),
                other => println!("{:<20} {}", format!("{}:", name).bold(), other),
            }
        }
    }

    Ok(())
}

/// Validated settings without any secret
pub fn summarize(config: &DirAuthConfig) -> Result<Value> {
    let provider = config
        .provider_config()
        .context("Invalid directory configuration")?;
    let catalog = config.group_catalog().context("Invalid group catalog")?;

    let mut summary = json!({
        "provider_type": provider.provider_type().to_string(),
        "url": provider.url,
        "users_base": provider.users_base(),
        "groups_base": provider.groups_base(),
        "timeout_seconds": provider.session.timeout.as_secs(),
        "start_tls": provider.session.start_tls,
        "override": provider.override_enabled(),
        "groups": catalog.iter().collect::<std::collections::BTreeMap<_, _>>(),
    });

    match &provider.kind {
        ProviderKind::DomainDirectory(domain) => {
            summary["domain_suffix"] = json!(domain.domain_suffix);
            summary["anonymous_bind_identity"] = json!(domain.anonymous_bind.identity);
            summary["requested_attributes"] = json!(domain.requested_attributes);
        }
        ProviderKind::LegacyDirectory(legacy) => {
            summary["group_attribute"] = json!(legacy.group_attribute);
            summary["member_attribute"] = json!(legacy.member_attribute);
        }
    }

    Ok(summary)
}
