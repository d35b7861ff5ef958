//! BEDbase configuration manager.
//!
//! [`BedBaseConf`] ties together a BEDbase YAML config file and the SQLite
//! tables it describes. The bedstat and bedbuncher pipelines use it to
//! record their outputs; the BEDbase server uses it to read them back.
//!
//! # Config file
//!
//! ```yaml
//! path:
//!   pipeline_output_path: $BEDBASE_DATA/outputs
//!   bedstat_dir: bedstat_output
//!   bedbuncher_dir: bedbuncher_output
//!   remote_url_base: https://data.bedbase.org   # optional
//! database:                                      # optional, defaults shown
//!   host: localhost
//!   name: postgres
//!   bed_table: bedfiles
//!   bedset_table: bedsets
//!   relationship_table: bedset_bedfiles
//! server:                                        # optional
//!   host: 0.0.0.0
//!   port: 80
//! ```
//!
//! The file is taken from the path passed to [`BedBaseConf::new`] or, when
//! none is passed, from the `$BEDBASE` environment variable. `$VAR` and
//! `${VAR}` references in values are expanded from the environment.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use bbconf::{BedBaseConf, Condition};
//! use serde_json::json;
//!
//! let mut bbc = BedBaseConf::new(Some(Path::new("bedbase.yaml"))).unwrap();
//! bbc.create_bedfiles_table(None).unwrap();
//! bbc.create_bedsets_table(None).unwrap();
//! bbc.create_bedset_bedfiles_table(None).unwrap();
//!
//! let bed = json!({"name": "sample1", "md5sum": "abc", "bedfile_path": "/data/sample1.bed"});
//! let bed_id = bbc.insert_bedfile_data(bed.as_object().unwrap()).unwrap();
//!
//! let set = json!({"name": "promoters", "md5sum": "def"});
//! let set_id = bbc.insert_bedset_data(set.as_object().unwrap()).unwrap();
//!
//! let link = json!({"bedfile_id": bed_id, "bedset_id": set_id});
//! bbc.insert_bedset_bedfiles_data(link.as_object().unwrap()).unwrap();
//!
//! let beds = bbc
//!     .select_bedfiles_for_bedset(&Condition::equals("name", "promoters"), None)
//!     .unwrap();
//! assert_eq!(beds.len(), 1);
//! ```

mod conf;
mod error;

pub use bbconf_core::{
    BedBaseSettings, CONFIG_ENV_VAR, ConfigError, ConfigMap, DatabaseSettings, PathSettings,
    ServerSettings, columns,
};
pub use bbconf_sqlite::{ColumnDefs, Condition, Database, DbError, Row};
pub use conf::BedBaseConf;
pub use error::{BedBaseConfError, Result};
