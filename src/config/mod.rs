/// Configuration system for busdash.
///
/// Settings come from four layers, later ones winning key by key:
///
/// 1. **Built-in defaults** from [`schema::BusdashConfig::default()`]
/// 2. **User file** `~/.busdash/config.toml`
/// 3. **Project file** `.busdash.toml` in the working directory
/// 4. **Environment** `BUSDASH_*` variables
///
/// File layers are merged as TOML trees before deserializing, so a project
/// file that only sets `timing.refresh_interval_secs` keeps everything else
/// from the user file.
///
/// # Pace
///
/// Once the layers are merged, `general.pace` is applied:
///
/// - **demo** keeps the staged delays as configured
/// - **instant** collapses login and navigation delays to zero
///
/// # Usage
///
/// ```rust,ignore
/// use busdash::config;
///
/// let cfg = config::load();
/// let dashboard = Dashboard::new(&cfg, ReferenceData::builtin(), ActivityLog::from_config(&cfg));
/// ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::BusdashConfig;

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Resolve the effective configuration from every layer.
pub fn load() -> BusdashConfig {
    let mut tree = toml::Value::Table(toml::map::Map::new());
    for path in [global_config_path(), project_config_path()] {
        if let Some(layer) = read_layer(path) {
            overlay(&mut tree, layer);
        }
    }

    let mut config: BusdashConfig = tree.try_into().unwrap_or_default();
    apply_env_overrides(&mut config);
    config.apply_pace();
    config
}

/// Read one config file as a raw TOML tree.
///
/// Missing files, unreadable files and files that would not deserialize into
/// a [`BusdashConfig`] on their own all yield `None`; a bad file is skipped
/// rather than keeping the dashboard from starting.
fn read_layer(path: Option<PathBuf>) -> Option<toml::Value> {
    let content = fs::read_to_string(path?).ok()?;
    let value: toml::Value = toml::from_str(&content).ok()?;
    let _: BusdashConfig = value.clone().try_into().ok()?;
    Some(value)
}

/// Recursively copy `layer` over `base`. Tables merge; anything else replaces.
fn overlay(base: &mut toml::Value, layer: toml::Value) {
    match (base, layer) {
        (toml::Value::Table(base), toml::Value::Table(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(existing) => overlay(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".busdash").join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".busdash.toml"))
}

/// `~/.busdash/config.toml`, if a home directory is known.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// `.busdash.toml` in the working directory.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Highest-precedence layer.
///
/// - `BUSDASH_PACE`: `demo` or `instant`
/// - `BUSDASH_REFRESH_SECS`: metric refresh period, seconds (> 0)
/// - `BUSDASH_SEED`: fixed jitter seed
/// - `BUSDASH_LOGGING`: activity log on/off
///
/// Values that don't parse are ignored.
fn apply_env_overrides(config: &mut BusdashConfig) {
    if let Ok(val) = std::env::var("BUSDASH_PACE")
        && let Some(pace) = parse_pace(&val)
    {
        config.general.pace = pace;
    }
    if let Ok(val) = std::env::var("BUSDASH_REFRESH_SECS")
        && let Ok(secs) = val.parse::<u64>()
        && secs > 0
    {
        config.timing.refresh_interval_secs = secs;
    }
    if let Ok(val) = std::env::var("BUSDASH_SEED")
        && let Ok(seed) = val.parse::<u64>()
    {
        config.jitter.seed = Some(seed);
    }
    if let Ok(val) = std::env::var("BUSDASH_LOGGING") {
        config.logging.enabled = is_truthy(&val);
    }
}

fn is_truthy(val: &str) -> bool {
    let val = val.trim().to_ascii_lowercase();
    matches!(val.as_str(), "1" | "true" | "yes" | "on")
}

fn parse_pace(val: &str) -> Option<schema::Pace> {
    match val.trim().to_ascii_lowercase().as_str() {
        "demo" => Some(schema::Pace::Demo),
        "instant" | "fast" => Some(schema::Pace::Instant),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Editing the user file
// ---------------------------------------------------------------------------

/// Write the annotated defaults to `~/.busdash/config.toml`.
///
/// Refuses to clobber an existing file unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }

    write_user_file(&path, &BusdashConfig::default_toml())?;
    Ok(path)
}

/// Change one dotted key (e.g. `timing.login_delay_ms`) in the user file.
///
/// Starts from the defaults when no file exists yet. The edited file must
/// still deserialize, otherwise nothing is written.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?
    } else {
        toml::to_string_pretty(&BusdashConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value = toml::from_str(&content)
        .with_context(|| format!("{} is not valid TOML", path.display()))?;
    set_toml_value(&mut root, key, value)?;

    let updated = toml::to_string_pretty(&root).context("failed to serialize config")?;
    toml::from_str::<BusdashConfig>(&updated)
        .with_context(|| format!("invalid value '{value}' for '{key}'"))?;

    write_user_file(&path, &updated)
}

fn write_user_file(path: &Path, content: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}

/// Assign `raw_value` at `section.field`, keeping the existing value's type.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let Some((section, field)) = key.split_once('.') else {
        anyhow::bail!("config key must look like 'section.field', got '{key}'");
    };
    if section.is_empty() || field.is_empty() || field.contains('.') {
        anyhow::bail!("config key must look like 'section.field', got '{key}'");
    }

    let table = root
        .get_mut(section)
        .and_then(toml::Value::as_table_mut)
        .with_context(|| format!("unknown config section '{section}'"))?;

    let typed = match table.get(field) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => toml::Value::Integer(
            raw_value
                .parse()
                .with_context(|| format!("'{key}' takes a whole number, got '{raw_value}'"))?,
        ),
        Some(toml::Value::Float(_)) => toml::Value::Float(
            raw_value
                .parse()
                .with_context(|| format!("'{key}' takes a number, got '{raw_value}'"))?,
        ),
        Some(_) => toml::Value::String(raw_value.to_string()),
        // Optional keys such as `jitter.seed` are absent until first set.
        None => raw_value
            .parse::<i64>()
            .map(toml::Value::Integer)
            .unwrap_or_else(|_| toml::Value::String(raw_value.to_string())),
    };

    table.insert(field.to_string(), typed);
    Ok(())
}

/// Overwrite the user file with the defaults.
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// The merged configuration rendered as TOML.
pub fn show_effective_config() -> Result<String> {
    toml::to_string_pretty(&load()).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
