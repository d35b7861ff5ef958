//! End-to-end bedset workflow example.
//!
//! Demonstrates what the bedstat and bedbuncher pipelines do with bbconf:
//! create the three tables, record bedfiles, group them into a bedset, and
//! query the bedset's members back.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p bbconf-demos --example bedset_workflow
//! ```

use bbconf::{BedBaseConf, Condition, Row};
use serde_json::{Value, json};

fn main() {
    // === Step 1: Write a config into a scratch directory ===
    let dir = std::env::temp_dir().join("bbconf_workflow_example");
    std::fs::create_dir_all(&dir).unwrap();
    let config_path = dir.join("bedbase.yaml");
    std::fs::write(
        &config_path,
        "\
path:
  pipeline_output_path: outputs
  bedstat_dir: bedstat_output
  bedbuncher_dir: bedbuncher_output
database:
  name: workflow.sqlite
",
    )
    .unwrap();
    std::fs::remove_file(dir.join("workflow.sqlite")).ok();

    // === Step 2: Connect and create tables ===
    println!("=== Tables ===");
    let mut bbc = BedBaseConf::new(Some(&config_path)).unwrap();
    bbc.establish_connection(false).unwrap();
    bbc.create_bedfiles_table(None).unwrap();
    bbc.create_bedsets_table(None).unwrap();
    bbc.create_bedset_bedfiles_table(None).unwrap();
    println!("Connected to {}", bbc.database().connection_description());
    for (name, ty) in bbc.bedfiles_column_types().unwrap().iter().take(5) {
        println!("  {name}: {ty}");
    }

    // === Step 3: Record bedfiles (what bedstat reports) ===
    println!("\n=== bedstat ===");
    let mut bed_ids = Vec::new();
    for (name, gc, regions) in [("liver_h3k27ac", 0.47, 51234), ("heart_ctcf", 0.41, 30877)] {
        let id = bbc
            .insert_bedfile_data(&object(json!({
                "name": name,
                "md5sum": format!("{name}-md5"),
                "bedfile_path": format!("/data/{name}.bed.gz"),
                "gc_content": gc,
                "regions_no": regions,
                "plots": [{"name": "chrombins", "caption": "Regions distribution over chromosomes"}],
            })))
            .unwrap();
        println!("Inserted bedfile {name} as id {id}");
        bed_ids.push(id);
    }

    // === Step 4: Group them into a bedset (what bedbuncher reports) ===
    println!("\n=== bedbuncher ===");
    let set_id = bbc
        .insert_bedset_data(&object(json!({
            "name": "encode_tissues",
            "md5sum": "encode_tissues-md5",
            "bedset_means": {"gc_content": 0.44, "regions_no": 41055.5},
        })))
        .unwrap();
    for bed_id in &bed_ids {
        bbc.insert_bedset_bedfiles_data(&object(json!({"bedfile_id": bed_id, "bedset_id": set_id})))
            .unwrap();
    }
    println!(
        "bedfiles: {}, bedsets: {}",
        bbc.count_bedfiles().unwrap(),
        bbc.count_bedsets().unwrap()
    );

    // === Step 5: Query ===
    println!("\n=== Queries ===");
    let gc_rich = bbc
        .select_bedfiles(
            Some(&["name", "gc_content"]),
            Some(&Condition::with_value("gc_content > ?", 0.45)),
        )
        .unwrap();
    println!("GC-rich bedfiles: {gc_rich:?}");

    let members = bbc
        .select_bedfiles_for_bedset(&Condition::equals("name", "encode_tissues"), Some(&["name"]))
        .unwrap();
    println!("Members of encode_tissues: {members:?}");

    // Cleanup
    bbc.close_connection().unwrap();
    std::fs::remove_dir_all(&dir).ok();
    println!("\nDone!");
}

fn object(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}
