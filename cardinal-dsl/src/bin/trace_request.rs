/// Request Tracer - Shows how a cardinality request body resolves
///
/// Usage: cargo run --bin trace_request <request.json> [catalog.toml]
///
/// The catalog file maps field names to kinds and may carry resolver settings:
///
/// ```toml
/// [resolver]
/// reject_duplicate_keys = true
///
/// [fields]
/// price = "numeric"
/// user_id = "other"
/// user_id_hash = "prehashed"
/// ```
///
/// Set RUST_LOG=cardinal_dsl=trace to see every key the parser consumes.

use cardinal_core::{
    FieldKind, FieldMapping, IndexedDataHandle, ResolverConfig, ScriptCompiler, ScriptError,
    ScriptParams,
};
use cardinal_dsl::CardinalityParser;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    resolver: ResolverConfig,
    #[serde(default)]
    fields: BTreeMap<String, FieldKind>,
}

/// Stands in for a real script engine: keeps what it was given.
#[derive(Debug, Serialize)]
struct EchoScript {
    lang: Option<String>,
    source: String,
    params: Option<ScriptParams>,
}

struct EchoCompiler;

impl ScriptCompiler for EchoCompiler {
    type Script = EchoScript;

    fn compile(
        &self,
        lang: Option<&str>,
        source: &str,
        params: Option<&ScriptParams>,
    ) -> Result<EchoScript, ScriptError> {
        Ok(EchoScript {
            lang: lang.map(str::to_string),
            source: source.to_string(),
            params: params.cloned(),
        })
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --bin trace_request <request.json> [catalog.toml]");
        eprintln!();
        eprintln!("Example:");
        eprintln!("  cargo run --bin trace_request requests/distinct_users.json catalog.toml");
        std::process::exit(1);
    }

    let request_path = Path::new(&args[1]);
    let body = match fs::read_to_string(request_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ Failed to read {}: {}", request_path.display(), e);
            std::process::exit(1);
        }
    };

    let catalog_file = match args.get(2) {
        Some(path) => match load_catalog(Path::new(path)) {
            Ok(file) => file,
            Err(e) => {
                eprintln!("❌ Failed to load catalog {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => CatalogFile::default(),
    };

    if let Err(e) = catalog_file.resolver.validate() {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let catalog: HashMap<String, FieldMapping> = catalog_file
        .fields
        .into_iter()
        .enumerate()
        .map(|(i, (name, kind))| (name, FieldMapping::new(kind, IndexedDataHandle(i as u64 + 1))))
        .collect();

    let name = request_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("request");

    println!("╔═══════════════════════════════════════════════════════════════");
    println!("║ CARDINALITY REQUEST TRACER");
    println!("╚═══════════════════════════════════════════════════════════════\n");

    println!("📝 INPUT REQUEST [{}]:", name);
    println!("{}", body.trim_end());
    println!();

    println!("📚 CATALOG:");
    let mut fields: Vec<_> = catalog.iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));
    for (field, mapping) in fields {
        println!("  {} → {}", field, mapping.kind);
    }
    println!();

    let parser = CardinalityParser::new(catalog_file.resolver);
    match parser.resolve_json(name, &body, &catalog, &EchoCompiler) {
        Ok(resolved) => {
            println!("✅ RESOLVED:");
            match serde_json::to_string_pretty(&resolved) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("❌ Failed to render resolved config: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    }
}

fn load_catalog(path: &Path) -> Result<CatalogFile, String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    toml::from_str(&content).map_err(|e| e.to_string())
}
