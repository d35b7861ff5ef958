//! Default column definitions for the bedfiles, bedsets and join tables.
//!
//! The bedstat and bedbuncher pipelines report a fixed set of fields per
//! BED file and per BED set. These helpers turn the field lists into column
//! definition strings, enriched with types and `NOT NULL` / `UNIQUE`
//! constraints, ready to pass to a `create_table` call.

/// Identifier column shared by the bedfiles and bedsets tables.
pub const ID_COLUMN: &str = "id INTEGER PRIMARY KEY AUTOINCREMENT";

/// Join-table column referencing a bedfile row.
pub const REL_BED_ID_KEY: &str = "bedfile_id";
/// Join-table column referencing a bedset row.
pub const REL_BEDSET_ID_KEY: &str = "bedset_id";

/// Float-valued genomic statistics reported per BED file.
pub const BED_FLOAT_COLUMNS: &[&str] = &[
    "gc_content",
    "mean_absolute_tss_dist",
    "mean_region_width",
    "exon_frequency",
    "intron_frequency",
    "promoterprox_frequency",
    "intergenic_frequency",
    "promotercore_frequency",
    "fiveutr_frequency",
    "fiveutr_percentage",
    "threeutr_frequency",
    "threeutr_percentage",
    "promoterprox_percentage",
    "exon_percentage",
    "intron_percentage",
    "intergenic_percentage",
    "promotercore_percentage",
];

pub const BED_INT_COLUMNS: &[&str] = &["regions_no"];
pub const BED_CHAR_COLUMNS: &[&str] = &["md5sum", "bedfile_path", "name"];
pub const BED_JSON_COLUMNS: &[&str] = &["plots", "other"];
pub const BED_NONNULL_COLUMNS: &[&str] = &["name", "md5sum", "bedfile_path"];
pub const BED_UNIQUE_COLUMNS: &[&str] = &["md5sum"];

pub const BEDSET_CHAR_COLUMNS: &[&str] = &[
    "md5sum",
    "name",
    "bedset_tar_archive_path",
    "bedset_bedfiles_gd_stats",
    "bedset_gd_stats",
    "bedset_igd_database_path",
    "bedset_pep",
];
pub const BEDSET_JSON_COLUMNS: &[&str] = &[
    "plots",
    "bedset_means",
    "bedset_standard_deviation",
    "bedset_bed_ids",
];
pub const BEDSET_NONNULL_COLUMNS: &[&str] = &["name", "md5sum"];
pub const BEDSET_UNIQUE_COLUMNS: &[&str] = &["md5sum"];

/// Column identifying a bedfile or bedset record when updating in place.
pub const RECORD_KEY_COLUMN: &str = "md5sum";

/// Column type templates. `{}` is replaced by the column name.
const COL_FLOAT: &str = "{} FLOAT";
const COL_INT: &str = "{} INTEGER";
const COL_JSON: &str = "{} JSONB";
const COL_CHAR: &str = "{} VARCHAR(300)";

/// Builds column definitions from a type template and constraint lists.
///
/// # Examples
///
/// ```
/// use bbconf_core::columns::make_columns;
///
/// let cols = make_columns("{} TEXT", &["a", "b"], &["a"], &["b"]);
/// assert_eq!(cols, vec!["a TEXT NOT NULL", "b TEXT UNIQUE"]);
/// ```
pub fn make_columns(
    template: &str,
    columns: &[&str],
    nonnull: &[&str],
    unique: &[&str],
) -> Vec<String> {
    columns
        .iter()
        .map(|col| {
            let mut def = template.replace("{}", col);
            if nonnull.contains(col) {
                def.push_str(" NOT NULL");
            }
            if unique.contains(col) {
                def.push_str(" UNIQUE");
            }
            def
        })
        .collect()
}

/// Default column set for the bedfiles table.
pub fn bed_columns() -> Vec<String> {
    let mut cols = vec![ID_COLUMN.to_string()];
    for (template, names) in [
        (COL_CHAR, BED_CHAR_COLUMNS),
        (COL_FLOAT, BED_FLOAT_COLUMNS),
        (COL_INT, BED_INT_COLUMNS),
        (COL_JSON, BED_JSON_COLUMNS),
    ] {
        cols.extend(make_columns(
            template,
            names,
            BED_NONNULL_COLUMNS,
            BED_UNIQUE_COLUMNS,
        ));
    }
    cols
}

/// Default column set for the bedsets table.
pub fn bedset_columns() -> Vec<String> {
    let mut cols = vec![ID_COLUMN.to_string()];
    for (template, names) in [(COL_CHAR, BEDSET_CHAR_COLUMNS), (COL_JSON, BEDSET_JSON_COLUMNS)] {
        cols.extend(make_columns(
            template,
            names,
            BEDSET_NONNULL_COLUMNS,
            BEDSET_UNIQUE_COLUMNS,
        ));
    }
    cols
}

/// Default column set for the join table linking `bed_table` rows to
/// `bedset_table` rows.
///
/// Both references cascade on delete and each pair is stored once.
pub fn relationship_columns(bed_table: &str, bedset_table: &str) -> Vec<String> {
    vec![
        format!(
            "{REL_BED_ID_KEY} INTEGER NOT NULL REFERENCES {bed_table}(id) ON DELETE CASCADE"
        ),
        format!(
            "{REL_BEDSET_ID_KEY} INTEGER NOT NULL REFERENCES {bedset_table}(id) ON DELETE CASCADE"
        ),
        format!("PRIMARY KEY ({REL_BED_ID_KEY}, {REL_BEDSET_ID_KEY})"),
    ]
}
