//! Config inspection example.
//!
//! Loads a BEDbase config file, prints the validated settings with defaults
//! filled in, and shows how a relative database name is resolved.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p bbconf-demos --example inspect_config -- path/to/bedbase.yaml
//! BEDBASE=path/to/bedbase.yaml cargo run -p bbconf-demos --example inspect_config
//! ```
//!
//! Without an argument or `$BEDBASE`, a sample config is written to a
//! temporary directory and used instead.

use std::path::PathBuf;

use bbconf::BedBaseConf;
use bbconf_core::{CONFIG_ENV_VAR, ConfigMap};

const SAMPLE_CONFIG: &str = "\
path:
  pipeline_output_path: /data/bedbase/outputs
  bedstat_dir: bedstat_output
  bedbuncher_dir: bedbuncher_output
  remote_url_base: https://data.bedbase.org
database:
  name: bedbase.sqlite
";

fn main() {
    let path = std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os(CONFIG_ENV_VAR))
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let dir = std::env::temp_dir().join("bbconf_inspect_example");
            std::fs::create_dir_all(&dir).unwrap();
            let path = dir.join("bedbase.yaml");
            std::fs::write(&path, SAMPLE_CONFIG).unwrap();
            println!("No config given, using sample at {}", path.display());
            path
        });

    // === Raw tree ===
    let raw = ConfigMap::load(&path).unwrap();
    println!("=== Raw config ===");
    print!("{}", raw.to_yaml_string().unwrap());
    if let Some(name) = raw.get("database.name") {
        println!("database.name as written: {name:?}");
    }

    // === Validated settings ===
    let bbc = BedBaseConf::new(Some(&path)).unwrap();
    let settings = bbc.settings();
    println!("\n=== Settings ===");
    println!("Config file: {}", bbc.file_path().unwrap().display());
    println!("Database: {}", bbc.database().connection_description());
    println!(
        "Tables: {}, {}, {}",
        settings.database.bed_table,
        settings.database.bedset_table,
        settings.database.relationship_table
    );
    println!("Server: {}:{}", settings.server.host, settings.server.port);

    // === Output locations ===
    println!("\n=== Outputs ===");
    println!("bedstat (local):     {}", bbc.bedstat_output_path(false).unwrap().display());
    println!("bedbuncher (local):  {}", bbc.bedbuncher_output_path(false).unwrap().display());
    match bbc.bedstat_output_path(true) {
        Ok(remote) => println!("bedstat (remote):    {}", remote.display()),
        Err(e) => println!("bedstat (remote):    unavailable ({e})"),
    }
}
