//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# winsync configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[coordinator]
# heartbeat_interval_ms = 1000   # 100-60000, rewrite own record at least this often
# stale_after_missed = 5         # 0-100, 0 disables pruning of abandoned windows
# poll_interval_ms = 250         # 16-10000, fallback reconcile interval
# id_retry_limit = 8             # 1-64

[store]
# backend = "file"               # file, memory
# directory = "/tmp/winsync"     # default: platform data dir /winsync/registry
# key = "windows"

[window]
# title = "winsync"
# width = 800                    # 100-8192
# height = 600                   # 100-8192
# settle_delay_ms = 500          # 0-5000

[scene]
# falloff = 0.05                 # 0.001-1.0
# frame_rate = 60                # 1-240

[logging]
# level = "info"                 # trace, debug, info, warn, error
"##
    .to_string()
}
