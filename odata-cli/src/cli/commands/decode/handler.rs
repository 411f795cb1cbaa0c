//! Decode command handler

use anyhow::{Context, Result};
use colored::*;
use std::fs;

use super::{DecodeCommands, PayloadKind};
use crate::cli::load_config;
use crate::resource::Resource;
use crate::response::headers::parse_header_line;
use crate::response::{Annotations, ResponseEnvelope};
use crate::schema::{self, SchemaRegistry};
use crate::value::ODataValue;

/// Decode a stored response body and print `{data, meta}`
pub fn handle_decode_command(args: DecodeCommands) -> Result<()> {
    let config = load_config(&args.schema)?;
    let registry = SchemaRegistry::configure(&config).context("Failed to build schema registry")?;
    let registry = schema::install(registry)?;

    let resource = Resource::of_type(registry, &args.type_name)
        .with_context(|| format!("Cannot decode as '{}'", args.type_name))?;

    let headers = args
        .headers
        .iter()
        .map(|line| {
            parse_header_line(line)
                .ok_or_else(|| anyhow::anyhow!("Header must look like 'Name: value', got '{}'", line))
        })
        .collect::<Result<Vec<_>>>()?;

    let content = fs::read_to_string(&args.body)
        .with_context(|| format!("Failed to read body file: {}", args.body.display()))?;
    let body = if content.trim().is_empty() {
        None
    } else {
        Some(
            serde_json::from_str::<serde_json::Value>(&content)
                .with_context(|| format!("Body is not valid JSON: {}", args.body.display()))?,
        )
    };

    let response = ResponseEnvelope::new(resource, args.status, headers, body);
    let options = response.options();
    log::info!(
        "Decoding {:?} payload: version {}, metadata {:?}",
        args.kind,
        options.version,
        options.metadata
    );

    let output = match args.kind {
        PayloadKind::Entity => response
            .entity()?
            .map(|p| envelope_json(p.data.to_json(), &p.meta))
            .transpose()?,
        PayloadKind::Entities => response
            .entities()?
            .map(|p| {
                let data = p.data.iter().map(ODataValue::to_json).collect();
                envelope_json(serde_json::Value::Array(data), &p.meta)
            })
            .transpose()?,
        PayloadKind::Property => response
            .property()?
            .map(|p| envelope_json(p.data.to_json(), &p.meta))
            .transpose()?,
        PayloadKind::Value => response.value()?.map(|v| v.to_json()),
    };

    match output {
        Some(json) => {
            let text = if args.compact {
                serde_json::to_string(&json)?
            } else {
                serde_json::to_string_pretty(&json)?
            };
            println!("{}", text);
        }
        None => eprintln!("{}", "Response has no body".yellow()),
    }
    Ok(())
}

fn envelope_json(data: serde_json::Value, meta: &Annotations) -> Result<serde_json::Value> {
    Ok(serde_json::json!({
        "data": data,
        "meta": serde_json::to_value(meta).context("Failed to render annotations")?,
    }))
}
