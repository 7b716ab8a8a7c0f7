// sysdeps-common/src/config.rs
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use directories::UserDirs;
use serde::Deserialize;
use tracing::{debug, warn};

use super::error::{Result, SysdepsError};
use super::model::ScopeFilter;

const DEFAULT_METADATA_DIR: &str = "/usr/share/maven-poms";
const DEFAULT_JAR_DIR: &str = "/usr/share/java";
const DEFAULT_NATIVE_DIR: &str = "/usr/lib/java";
const DEFAULT_SCAN_DEPTH: usize = 10;
const DEFAULT_INHERITANCE_DEPTH: usize = 64;
const DEFAULT_INTERPOLATION_PASSES: usize = 10;

pub const CONFIG_ENV: &str = "SYSDEPS_CONFIG";
pub const METADATA_DIR_ENV: &str = "SYSDEPS_METADATA_DIR";
pub const JAR_DIR_ENV: &str = "SYSDEPS_JAR_DIR";
pub const NATIVE_DIR_ENV: &str = "SYSDEPS_NATIVE_DIR";
pub const SCAN_DEPTH_ENV: &str = "SYSDEPS_SCAN_DEPTH";
pub const SCAN_WORKERS_ENV: &str = "SYSDEPS_SCAN_WORKERS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Trees holding descriptor files.
    pub metadata_dirs: Vec<PathBuf>,
    /// Flat or layout-structured jar directories.
    pub jar_dirs: Vec<PathBuf>,
    pub native_library_dirs: Vec<PathBuf>,
    pub scan_depth: usize,
    pub scan_workers: usize,
    pub max_inheritance_depth: usize,
    pub max_interpolation_passes: usize,
    pub scopes: ScopeFilter,
    /// Win over every property a descriptor defines.
    pub properties: BTreeMap<String, String>,
    pub active_profiles: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            metadata_dirs: vec![PathBuf::from(DEFAULT_METADATA_DIR)],
            jar_dirs: vec![PathBuf::from(DEFAULT_JAR_DIR)],
            native_library_dirs: vec![PathBuf::from(DEFAULT_NATIVE_DIR)],
            scan_depth: DEFAULT_SCAN_DEPTH,
            scan_workers: num_cpus::get().max(1),
            max_inheritance_depth: DEFAULT_INHERITANCE_DEPTH,
            max_interpolation_passes: DEFAULT_INTERPOLATION_PASSES,
            scopes: ScopeFilter::default(),
            properties: BTreeMap::new(),
            active_profiles: Vec::new(),
        }
    }
}

/// On-disk shape of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    metadata_dirs: Option<Vec<PathBuf>>,
    jar_dirs: Option<Vec<PathBuf>>,
    native_library_dirs: Option<Vec<PathBuf>>,
    scan_depth: Option<usize>,
    scan_workers: Option<usize>,
    max_inheritance_depth: Option<usize>,
    max_interpolation_passes: Option<usize>,
    scopes: Option<Vec<String>>,
    #[serde(default)]
    properties: BTreeMap<String, String>,
    #[serde(default)]
    profiles: Vec<String>,
}

impl Config {
    /// Defaults, then the config file, then `SYSDEPS_*` environment variables.
    pub fn load() -> Result<Self> {
        debug!("Loading sysdeps configuration");
        let mut config = Config::default();

        let path = env::var(CONFIG_ENV)
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .or_else(default_config_path);
        match path {
            Some(path) if path.is_file() => config.merge_file(&path)?,
            Some(path) => debug!("No config file at {}, using defaults", path.display()),
            None => debug!("Could not determine home directory, skipping config file"),
        }

        config.apply_env(env::vars());
        debug!("Configuration loaded successfully.");
        Ok(config)
    }

    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        debug!("Reading config file {}", path.display());
        let text = fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&text)?;
        self.apply_file(file)
    }

    fn apply_file(&mut self, file: ConfigFile) -> Result<()> {
        if let Some(dirs) = file.metadata_dirs {
            self.metadata_dirs = dedup_paths(dirs);
        }
        if let Some(dirs) = file.jar_dirs {
            self.jar_dirs = dedup_paths(dirs);
        }
        if let Some(dirs) = file.native_library_dirs {
            self.native_library_dirs = dedup_paths(dirs);
        }
        if let Some(depth) = file.scan_depth {
            self.scan_depth = depth;
        }
        if let Some(workers) = file.scan_workers {
            self.scan_workers = workers.max(1);
        }
        if let Some(depth) = file.max_inheritance_depth {
            self.max_inheritance_depth = depth;
        }
        if let Some(passes) = file.max_interpolation_passes {
            self.max_interpolation_passes = passes;
        }
        if let Some(scopes) = file.scopes {
            self.scopes = ScopeFilter::parse_list(&scopes.join(","))?;
        }
        self.properties.extend(file.properties);
        for profile in file.profiles {
            if !self.active_profiles.contains(&profile) {
                self.active_profiles.push(profile);
            }
        }
        Ok(())
    }

    /// Applies recognised `SYSDEPS_*` variables from `vars`.
    pub fn apply_env<I>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            match key.as_str() {
                METADATA_DIR_ENV => self.metadata_dirs = split_path_list(&value),
                JAR_DIR_ENV => self.jar_dirs = split_path_list(&value),
                NATIVE_DIR_ENV => self.native_library_dirs = split_path_list(&value),
                SCAN_DEPTH_ENV => match value.trim().parse() {
                    Ok(depth) => self.scan_depth = depth,
                    Err(_) => warn!("Ignoring invalid {SCAN_DEPTH_ENV} value '{value}'"),
                },
                SCAN_WORKERS_ENV => match value.trim().parse::<usize>() {
                    Ok(workers) => self.scan_workers = workers.max(1),
                    Err(_) => warn!("Ignoring invalid {SCAN_WORKERS_ENV} value '{value}'"),
                },
                _ => continue,
            }
            debug!("Applied {key} from environment");
        }
    }

    pub fn config_dir() -> Option<PathBuf> {
        UserDirs::new().map(|dirs| dirs.home_dir().join(".sysdeps"))
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    Config::config_dir().map(|dir| dir.join("config.toml"))
}

/// Splits a comma separated path list, dropping blanks and repeats.
pub fn split_path_list(value: &str) -> Vec<PathBuf> {
    dedup_paths(
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from),
    )
}

fn dedup_paths<I: IntoIterator<Item = PathBuf>>(paths: I) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::new();
    for path in paths {
        if !out.contains(&path) {
            out.push(path);
        }
    }
    out
}

/// Parses `key=value`; a bare `key` means `key=true`.
pub fn parse_property(text: &str) -> Result<(String, String)> {
    let (key, value) = text.split_once('=').unwrap_or((text, "true"));
    let key = key.trim();
    if key.is_empty() {
        return Err(SysdepsError::Config(format!("invalid property '{text}'")));
    }
    Ok((key.to_string(), value.to_string()))
}
