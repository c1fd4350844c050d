use cinelist::app::cache::cache_dir;
use cinelist::config::load_config;
use cinelist::storage::open_store;
use cinelist::watched::{read_done_list, STORAGE_MOVIES_DONE};
use std::env;
use std::fs::File;
use std::io::{self, Write};
use tracing_subscriber::EnvFilter;

fn main() -> io::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();

    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        eprintln!("Usage: cargo run --bin done_explorer [--json] [--out file]");
        return Ok(());
    }

    let as_json = args.iter().any(|a| a == "--json");
    let out_file: Option<String> = args
        .iter()
        .position(|a| a == "--out")
        .and_then(|i| args.get(i + 1).cloned());

    let cfg = load_config();
    let dir = cache_dir();
    eprintln!("Opening {:?} store under {}", cfg.store_backend, dir.display());

    let store = open_store(cfg.store_backend, &dir);
    let entries = read_done_list(&*store);

    let mut output = String::new();
    if as_json {
        let body = serde_json::to_string_pretty(&entries).map_err(io::Error::other)?;
        output.push_str(&body);
        output.push('\n');
    } else {
        output.push_str(&format!(
            "--- Slot: {} ({} entries, newest first) ---\n",
            STORAGE_MOVIES_DONE,
            entries.len()
        ));
        for e in &entries {
            output.push_str(&format!(
                "{:>8}  {}  {}  {}\n",
                e.id,
                e.updated_at,
                if e.is_dubbed { "DUB" } else { "   " },
                e.title
            ));
        }
    }

    if let Some(path) = out_file {
        File::create(&path)?.write_all(output.as_bytes())?;
        eprintln!("Exported results to {}", path);
    } else {
        print!("{}", output);
    }

    Ok(())
}
