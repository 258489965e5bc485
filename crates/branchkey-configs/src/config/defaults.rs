// Default value functions

pub fn default_resource_id() -> String {
    "default".to_string()
}

pub fn default_schema_cache_max_entries() -> usize {
    1024
}

pub fn default_fetch_timeout_ms() -> u64 {
    0 // 0 = inherit the enclosing branch timeout only
}

pub fn default_true() -> bool {
    true
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_log_format() -> String {
    "compact".to_string()
}

pub fn default_log_file_path() -> String {
    "./logs/branchkey.log".to_string()
}
