//! URL command handler

use anyhow::{Context, Result};
use colored::*;

use super::UrlCommands;
use crate::cli::load_config;
use crate::codec::TypeParser;
use crate::edm::CodecOptions;
use crate::resource::{KeyValue, Literal, QueryOptions, Resource};
use crate::schema::SchemaRegistry;

/// Build a resource from path pieces and query options, then print its URL
pub fn handle_url_command(args: UrlCommands) -> Result<()> {
    let config = load_config(&args.schema)?;
    let registry = SchemaRegistry::configure(&config).context("Failed to build schema registry")?;
    let options = registry.options();
    let registry = std::sync::Arc::new(registry);

    let mut resource = Resource::root(registry.clone())
        .entity_set(&args.entity_set, &args.type_name)
        .with_context(|| format!("Cannot address entity set '{}'", args.entity_set))?;

    if let Some(text) = &args.key {
        let parser = registry.structured(&args.type_name)?;
        let key = key_value(&parser, text, &options)
            .with_context(|| format!("Invalid key '{}' for '{}'", text, args.type_name))?;
        resource = resource.key(key)?;
    }

    for name in &args.navigation {
        resource = resource
            .navigation_property(name)
            .with_context(|| format!("Cannot navigate to '{}'", name))?;
    }

    if let Some(property) = &args.property {
        resource = resource.property(property)?;
    }

    resource = resource.with_query(query_options(&args));

    if args.count {
        resource = resource.count()?;
    }

    if args.relative {
        println!("{}", resource);
    } else {
        println!("{}", resource.url());
    }

    if let Some(type_name) = resource.type_name() {
        log::info!("Resource targets {}", type_name);
        eprintln!("{} {}", "type:".dimmed(), type_name.cyan());
    }
    Ok(())
}

fn query_options(args: &UrlCommands) -> QueryOptions {
    let mut query = QueryOptions::new();
    if !args.select.is_empty() {
        query = query.select(args.select.iter().map(|s| s.trim().to_string()));
    }
    if !args.expand.is_empty() {
        query = query.expand_paths(&args.expand);
    }
    if let Some(filter) = &args.filter {
        query = query.filter(filter.as_str());
    }
    if let Some(orderby) = &args.orderby {
        query = query.orderby(orderby.as_str());
    }
    if let Some(top) = args.top {
        query = query.top(top);
    }
    if let Some(skip) = args.skip {
        query = query.skip(skip);
    }
    if let Some(search) = &args.search {
        query = query.search(search.as_str());
    }
    if args.inline_count {
        query = query.count(true);
    }
    if let Some(format) = &args.format {
        query = query.format(format.as_str());
    }
    query
}

/// `russellwhyte`, `'russellwhyte'` or `PersonName=russellwhyte,TripId=1003`
fn key_value(parser: &TypeParser<'_>, text: &str, options: &CodecOptions) -> Result<KeyValue> {
    if text.contains('=') {
        let parts = text
            .split(',')
            .map(|pair| {
                let (name, raw) = pair
                    .split_once('=')
                    .ok_or_else(|| anyhow::anyhow!("Expected Name=value, got '{}'", pair))?;
                let name = name.trim();
                Ok((name.to_string(), field_literal(parser, name, raw.trim(), options)?))
            })
            .collect::<Result<Vec<_>>>()?;
        return Ok(KeyValue::Composite(parts));
    }

    match parser.keys() {
        [single] => Ok(KeyValue::Single(field_literal(parser, single, text.trim(), options)?)),
        [] => anyhow::bail!("Type '{}' declares no key", parser.type_name()),
        keys => anyhow::bail!(
            "Type '{}' has a composite key ({}); use Name=value,...",
            parser.type_name(),
            keys.join(", ")
        ),
    }
}

/// Decode text through the key field's codec, then render its URL literal
fn field_literal(parser: &TypeParser<'_>, field: &str, raw: &str, options: &CodecOptions) -> Result<Literal> {
    let codec = parser.parser_for_field(field)?;
    let unquoted = raw
        .strip_prefix('\'')
        .and_then(|r| r.strip_suffix('\''))
        .unwrap_or(raw);

    let value = match codec.deserialize(&serde_json::Value::String(unquoted.to_string()), options) {
        Ok(value) => value,
        Err(string_err) => {
            // Booleans and numbers given bare on the command line
            let json: serde_json::Value =
                serde_json::from_str(unquoted).map_err(|_| string_err.clone())?;
            codec.deserialize(&json, options).map_err(|_| string_err)?
        }
    };
    Ok(codec.to_literal(&value)?)
}
