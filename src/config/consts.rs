/// Environment variable carrying the engine settings JSON.
pub const SETTINGS_ENV: &str = "SENZING_ENGINE_CONFIGURATION_JSON";
/// Environment variable pointing at an explicit runner config file.
pub const RUNNER_CONFIG_ENV: &str = "SNIPPET_RUNNER_CONFIG";
/// Runner config picked up from the working directory when present.
pub const RUNNER_CONFIG_FILE: &str = "snippet-runner.yaml";

pub const INSTALL_DIR_ENV: &str = "SENZING_DIR";
pub const CONFIG_DIR_ENV: &str = "SENZING_ETC_DIR";
pub const SUPPORT_DIR_ENV: &str = "SENZING_DATA_DIR";
pub const RESOURCE_DIR_ENV: &str = "SENZING_RESOURCE_DIR";

pub const SOURCE_KEY_PREFIX: &str = "source.";
pub const LOAD_KEY_PREFIX: &str = "load.";
pub const INPUT_KEY_PREFIX: &str = "input.";
pub const DESTROY_AFTER_KEY: &str = "destroyAfter";

/// Data source assigned to preloaded records that do not name one.
pub const PLACEHOLDER_DATA_SOURCE: &str = "TEST";
pub const DATA_SOURCE_FIELD: &str = "DATA_SOURCE";
pub const RECORD_ID_FIELD: &str = "RECORD_ID";

/// Exit code of a process that died from SIGTERM (128 + 15).
pub const TERMINATED_EXIT_CODE: i32 = 143;
/// Delay before scripted input is written to a freshly spawned snippet.
pub const DEFAULT_INPUT_DELAY_MS: u64 = 1_000;
/// Time allowed between the graceful and the forced termination request.
pub const DEFAULT_TERMINATION_GRACE_MS: u64 = 10_000;

pub const TEMP_DATABASE_PREFIX: &str = "G2C-";
pub const TEMP_DATABASE_SUFFIX: &str = ".db";
pub const SCHEMA_DIR: &str = "schema";
pub const SCHEMA_FILE: &str = "szcore-schema-sqlite-create.sql";
pub const TEMPLATES_DIR: &str = "templates";
pub const CONFIG_TEMPLATE_FILE: &str = "g2config.json";
pub const DEFAULT_CONFIG_COMMENT: &str = "Default Config";

/// Files that must exist in an explicitly configured config directory.
pub const REQUIRED_CONFIG_FILES: &[&str] = &["cfgVariant.json"];

/// Engine calls allowed in flight at once by the demo loaders.
pub const DEFAULT_WORKER_COUNT: usize = 8;
/// Pending work allowed per worker before submission pauses.
pub const DEFAULT_BACKLOG_FACTOR: usize = 10;
pub const DEFAULT_LOAD_PAUSE_MS: u64 = 100;
/// Wait between polls of an empty redo queue.
pub const DEFAULT_REDO_PAUSE_MS: u64 = 30_000;
pub const RETRY_FILE_PREFIX: &str = "retry-";
pub const RETRY_FILE_SUFFIX: &str = ".jsonl";
