//! `wallet list` - discovery dump

use crate::cli::{CliContext, OutputFormat, OutputFormatter};
use crate::error::CwpResult;
use crate::registry::{pick_default, ProviderInfo};
use serde_json::{json, Map, Value};

pub const NO_PROVIDERS_MESSAGE: &str = "No wallet providers found on PATH";

pub async fn execute(ctx: &CliContext) -> CwpResult<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let registry = ctx.registry();

    ctx.status("Discovering wallet providers...");
    let providers = registry.discover().await;
    ctx.debug(&format!("{} provider(s) found", providers.len()));

    let default = pick_default(&providers, registry.config()).map(|p| p.short_name.clone());

    match ctx.output_format {
        OutputFormat::Json => formatter.json(&list_payload(&providers, default.as_deref())),
        OutputFormat::Table => {
            if providers.is_empty() {
                formatter.warning(NO_PROVIDERS_MESSAGE);
                return Ok(());
            }
            formatter.table_header(&["", "NAME", "VERSION", "CHAINS", "CAPABILITIES", "STATUS"]);
            for provider in &providers {
                let marker = if default.as_deref() == Some(provider.short_name.as_str()) {
                    "*"
                } else {
                    " "
                };
                let version = provider.info.as_ref().map_or("-", |i| i.version.as_str());
                let chains = provider.chains().join(",");
                let capabilities = provider.capabilities().join(",");
                let status = provider.error.as_deref().unwrap_or("ok");
                formatter.table_row(&[
                    marker,
                    provider.display_name(),
                    version,
                    chains.as_str(),
                    capabilities.as_str(),
                    status,
                ]);
            }
        }
    }

    Ok(())
}

/// `{"providers": [...]}` with the advertised info merged into each entry.
/// Advertised fields win over the scanned ones, `name` included.
pub fn list_payload(providers: &[ProviderInfo], default: Option<&str>) -> Value {
    if providers.is_empty() {
        return json!({ "providers": [], "message": NO_PROVIDERS_MESSAGE });
    }

    let entries: Vec<Value> = providers
        .iter()
        .map(|provider| {
            let mut entry = Map::new();
            entry.insert("name".into(), json!(provider.short_name));
            entry.insert("binary".into(), json!(provider.binary));
            entry.insert("path".into(), json!(provider.path));
            if let Some(Value::Object(info)) = provider.info.as_ref().map(|i| json!(i)) {
                entry.extend(info);
            }
            if let Some(error) = &provider.error {
                entry.insert("error".into(), json!(error));
            }
            entry.insert(
                "default".into(),
                json!(default == Some(provider.short_name.as_str())),
            );
            Value::Object(entry)
        })
        .collect();

    json!({ "providers": entries })
}
