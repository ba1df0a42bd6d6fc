use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::Deserialize;

use crate::util::toml_date::TomlDate;

pub const STORE_ENV: &str = "WEEKLY_STORE";
pub const CFG_FILE_NAME: &str = "weekly.toml";

#[derive(Deserialize)]
pub struct Paths {
    pub template_dir: PathBuf,
    pub public_dir: PathBuf,
}

#[derive(Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Local,
    GitHub,
}

impl StoreKind {
    pub fn parse(value: &str) -> Option<StoreKind> {
        match value.trim().to_lowercase().as_str() {
            "local" => Some(StoreKind::Local),
            "github" => Some(StoreKind::GitHub),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
pub struct Content {
    /// Content root inside the store, `content/weeks`
    pub root: String,
    pub store: StoreKind,
    /// Base directory of the local store
    pub local_dir: PathBuf,
}

#[derive(Deserialize)]
pub struct GitHub {
    /// `owner/name`
    pub repo: String,
    pub branch: Option<String>,
    pub token_env: Option<String>,
    pub api_base: Option<String>,
}

impl GitHub {
    pub fn token_env(&self) -> &str {
        self.token_env.as_deref().unwrap_or("GITHUB_TOKEN")
    }
}

#[derive(Deserialize)]
pub struct Defaults {
    pub page_size: u32,
    pub cache_enabled: bool,
    pub words_per_minute: Option<u32>,
    pub summary_length: Option<usize>,
    /// Start of the first week when the blog has no posts yet
    pub first_week: Option<TomlDate>,
}

#[derive(Deserialize)]
pub struct Server {
    pub address: String,
    pub port: u16,
}

#[derive(Deserialize)]
pub struct Admin {
    pub password_env: Option<String>,
    pub password: Option<String>,
}

impl Admin {
    /// Environment first, then the configuration file. `None` disables the admin API.
    pub fn resolve_password(&self) -> Option<String> {
        let env_name = self.password_env.as_deref().unwrap_or("ADMIN_PASSWORD");
        env::var(env_name).ok()
            .filter(|p| !p.is_empty())
            .or_else(|| self.password.clone().filter(|p| !p.is_empty()))
    }
}

#[derive(Deserialize)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize)]
pub struct RssFeed {
    pub title: String,
    pub site_url: String,
    pub description: String,
    pub language: Option<String>,
    pub page_size: u32,
}

#[derive(Deserialize)]
pub struct Config {
    pub paths: Paths,
    pub content: Content,
    pub github: Option<GitHub>,
    pub defaults: Defaults,
    pub server: Server,
    pub admin: Option<Admin>,
    pub log: Option<Log>,
    pub rss_feed: Option<RssFeed>,
}

impl Config {
    /// `WEEKLY_STORE` wins over the configuration file.
    pub fn store_kind(&self) -> StoreKind {
        env::var(STORE_ENV).ok()
            .and_then(|v| StoreKind::parse(&v))
            .unwrap_or(self.content.store)
    }
}

fn parse_path(path: PathBuf) -> PathBuf {
    if !path.starts_with("${exe_dir}") {
        return path;
    }

    let exe_dir = match env::current_exe() {
        Ok(exe) => exe.parent().map(Path::to_path_buf).unwrap_or_default(),
        Err(_) => return path,
    };
    PathBuf::from(path.to_string_lossy().replace("${exe_dir}", &exe_dir.to_string_lossy()))
}

pub fn parse_config(cfg_content: &str) -> io::Result<Config> {
    let mut cfg: Config = match toml::from_str::<Config>(cfg_content) {
        Ok(cfg) => cfg,
        Err(e) => return Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    };

    cfg.paths = Paths {
        template_dir: parse_path(cfg.paths.template_dir),
        public_dir: parse_path(cfg.paths.public_dir),
    };
    cfg.content.local_dir = parse_path(cfg.content.local_dir);

    Ok(cfg)
}

pub fn read_config(cfg_path: &Path) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(e.kind(), format!("Error opening configuration file {}: {}", cfg_path.display(), e))),
    };

    parse_config(&cfg_content)
}

/// `weekly.toml` next to the executable, in the current directory, then in the user config directory.
pub fn find_config_path() -> Option<PathBuf> {
    let mut candidates = vec![];
    if let Some(exe_dir) = env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        candidates.push(exe_dir);
    }
    if let Ok(cur_dir) = env::current_dir() {
        candidates.push(cur_dir);
    }
    if let Some(cfg_dir) = dirs::config_dir() {
        candidates.push(cfg_dir.join("weekly"));
    }

    candidates.into_iter()
        .map(|dir| dir.join(CFG_FILE_NAME))
        .find(|path| path.exists())
}
