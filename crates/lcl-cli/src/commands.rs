use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use lcl_catalog::catalog::CATALOG_MAGIC;
use lcl_catalog::record::RECORD_MAGIC;
use lcl_catalog::tombstone::TOMBSTONE_MAGIC;
use lcl_catalog::url::URL_ENTRY_MAGIC;
use lcl_catalog::{AttributeTable, Catalog, ListingQuery, ListingRecord, Tombstone, UrlEntry};
use lcl_crypto::{AddressDeriver, ContentAddresser, DerivedAddress, SigningKey};
use lcl_server::{SignerServer, SignerServiceConfig};
use lcl_types::{Address, CatalogId, ExpandMode, ListingId};
use serde_json::json;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Digest(args) => cmd_digest(format, args),
        Command::Address(args) => cmd_address(format, args),
        Command::Attrs(args) => cmd_attrs(format, args),
        Command::Prefix(args) => cmd_prefix(format, args),
        Command::Decode(args) => cmd_decode(format, args),
        Command::Keygen => cmd_keygen(format),
        Command::Serve(args) => cmd_serve(args),
    }
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_digest(format: OutputFormat, args: DigestArgs) -> anyhow::Result<()> {
    let digest = ContentAddresser::digest_str(&args.text);
    let le = hex::encode(digest.to_le_bytes());
    match format {
        OutputFormat::Json => print_json(&json!({
            "text": args.text,
            "hex": digest.to_hex(),
            "le_hex": le,
            "bs58": digest.to_bs58(),
        })),
        OutputFormat::Text => {
            println!("{} {}", "digest:".bold(), digest.to_hex().yellow());
            println!("  stored (LE): {}", le.dimmed());
            println!("  base58:      {}", digest.to_bs58().cyan());
            Ok(())
        }
    }
}

fn deriver(program_id: Option<&str>) -> anyhow::Result<AddressDeriver> {
    match program_id {
        None => Ok(AddressDeriver::default()),
        Some(text) => {
            let program = Address::from_bs58(text).with_context(|| format!("invalid program id {text:?}"))?;
            Ok(AddressDeriver::new(program))
        }
    }
}

fn cmd_address(format: OutputFormat, args: AddressArgs) -> anyhow::Result<()> {
    let deriver = deriver(args.program_id.as_deref())?;
    let (kind, derived): (&str, DerivedAddress) = match args.kind {
        AddressKind::Url { content, mode } => {
            let mode = ExpandMode::from(mode);
            let digest = ContentAddresser::digest_str(&content);
            ("url entry", deriver.url_entry(mode, &digest)?)
        }
        AddressKind::Listing { catalog, uuid } => {
            let uuid: ListingId = uuid.parse().with_context(|| format!("invalid uuid {uuid:?}"))?;
            ("listing", deriver.listing(CatalogId(catalog), &uuid)?)
        }
        AddressKind::Catalog { id } => ("catalog", deriver.catalog(CatalogId(id))?),
    };
    match format {
        OutputFormat::Json => print_json(&json!({
            "kind": kind,
            "address": derived.address.to_bs58(),
            "bump": derived.bump,
            "program_id": deriver.program_id().to_bs58(),
        })),
        OutputFormat::Text => {
            println!("{} {}", format!("{kind}:").bold(), derived.address.to_bs58().yellow());
            println!("  bump: {}", derived.bump);
            Ok(())
        }
    }
}

fn cmd_attrs(format: OutputFormat, args: AttrsArgs) -> anyhow::Result<()> {
    let (table, bits) = match &args.action {
        AttrsAction::Pack { names, table } => {
            let table = AttributeTable::for_version(*table)?;
            (table, table.pack_names(names.iter().map(String::as_str))?.bits)
        }
        AttrsAction::Unpack { bits, table } => (AttributeTable::for_version(*table)?, *bits),
    };
    let names: Vec<&str> = table.unpack(bits).iter().map(|a| a.name()).collect();
    match format {
        OutputFormat::Json => print_json(&json!({
            "table": table.version(),
            "bits": bits,
            "attributes": names,
        })),
        OutputFormat::Text => {
            println!("{} 0x{:02x} ({:#010b})", "bits:".bold(), bits, bits);
            for attribute in table.order() {
                let on = names.contains(&attribute.name());
                let mark = if on { "✓".green() } else { "·".dimmed() };
                println!("  {mark} {}", attribute.name());
            }
            Ok(())
        }
    }
}

fn cmd_prefix(format: OutputFormat, args: PrefixArgs) -> anyhow::Result<()> {
    let mut query = ListingQuery::category(&args.category);
    for filter in &args.filters {
        query = query.filter(filter);
    }
    if let Some(catalog) = args.catalog {
        query = query.in_catalog(CatalogId(catalog));
    }
    let prefix = query.to_prefix()?;
    match format {
        OutputFormat::Json => print_json(&json!({
            "offset": prefix.offset,
            "len": prefix.bytes.len(),
            "hex": hex::encode(&prefix.bytes),
            "bs58": prefix.to_bs58(),
        })),
        OutputFormat::Text => {
            println!("{} {}", "offset:".bold(), prefix.offset);
            println!("{} {} bytes", "length:".bold(), prefix.bytes.len());
            println!("{} {}", "bytes:".bold(), prefix.to_bs58().yellow());
            Ok(())
        }
    }
}

fn read_account_hex(args: &DecodeArgs) -> anyhow::Result<Vec<u8>> {
    let text = match (&args.hex, &args.file) {
        (Some(hex), _) => hex.clone(),
        (None, Some(path)) => read_file(path)?,
        (None, None) => bail!("pass account data as hex or with --file"),
    };
    hex::decode(text.trim()).context("account data is not valid hex")
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// Decode any account kind by its magic.
pub fn decode_account(data: &[u8]) -> anyhow::Result<serde_json::Value> {
    let magic = data.get(..4).context("account data shorter than its magic")?;
    if magic == RECORD_MAGIC {
        let record = ListingRecord::decode(data)?;
        let mut value = serde_json::to_value(&record)?;
        value["kind"] = json!("listing");
        value["coordinates"] = json!(record.fields.coordinates());
        value["attribute_names"] = json!(record
            .fields
            .attributes
            .to_set()?
            .iter()
            .map(|a| a.name())
            .collect::<Vec<_>>());
        Ok(value)
    } else if magic == CATALOG_MAGIC {
        let mut value = serde_json::to_value(Catalog::decode(data)?)?;
        value["kind"] = json!("catalog");
        Ok(value)
    } else if magic == URL_ENTRY_MAGIC {
        let entry = UrlEntry::decode(data)?;
        Ok(json!({
            "kind": "url_entry",
            "mode": entry.mode.to_string(),
            "content": entry.content,
        }))
    } else if magic == TOMBSTONE_MAGIC {
        let mut value = serde_json::to_value(Tombstone::decode(data)?)?;
        value["kind"] = json!("removed_listing");
        Ok(value)
    } else {
        bail!("unrecognised account magic {}", hex::encode(magic))
    }
}

fn cmd_decode(format: OutputFormat, args: DecodeArgs) -> anyhow::Result<()> {
    let value = decode_account(&read_account_hex(&args)?)?;
    match format {
        OutputFormat::Json => print_json(&value),
        OutputFormat::Text => {
            println!("{} {}", "kind:".bold(), value["kind"].as_str().unwrap_or("?").green());
            if let serde_json::Value::Object(map) = &value {
                for (key, field) in map.iter().filter(|(k, _)| k.as_str() != "kind") {
                    println!("  {key}: {field}");
                }
            }
            Ok(())
        }
    }
}

fn cmd_keygen(format: OutputFormat) -> anyhow::Result<()> {
    let key = SigningKey::generate();
    let public = key.verifying_key().to_bs58();
    match format {
        OutputFormat::Json => print_json(&json!({ "secret": key.to_hex(), "public": public })),
        OutputFormat::Text => {
            println!("{} {}", "public:".bold(), public.yellow());
            println!("{} {}", "secret:".bold(), key.to_hex().red());
            println!("{}", "Keep the secret out of version control.".dimmed());
            Ok(())
        }
    }
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => SignerServiceConfig::load(path)?,
        None => SignerServiceConfig::default(),
    };
    if let Some(bind) = &args.bind {
        config.bind_addr = bind.parse().with_context(|| format!("invalid bind address {bind:?}"))?;
    }
    if config.catalogs.is_empty() {
        tracing::warn!("no catalogs configured; every signing request will be rejected");
    }
    let server = SignerServer::new(config)?;
    println!("{} signer service on {}", "▶".green().bold(), server.config().bind_addr.to_string().bold());
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(())
}
