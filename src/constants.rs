//! Shared defaults and fixed column sets

/// Columns of the combined per-sample view, in output order
pub const DESIRED_COLUMNS: [&str; 10] = [
    "sample",
    "ptid",
    "gender",
    "age",
    "lambda_dna_conversion_rate",
    "mean_insert_size",
    "percent_duplication",
    "pct_selected_bases",
    "fold_80_base_penalty",
    "pct_target_bases_10x",
];

/// Rendering of a missing value in the combined view
pub const MISSING_DISPLAY: &str = "N/A";

pub const COMBINED_FILE_NAME: &str = "combined.csv";

pub const DEFAULT_DATABASE_URL: &str = "cohort.db";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_EXPORT_DIR: &str = "exports";

/// Samples per page when browsing
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Environment overrides
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const CONFIG_PATH_ENV: &str = "COHORT_QC_CONFIG";
