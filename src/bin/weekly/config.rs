use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use weekly::config::{find_config_path, read_config, Config, CFG_FILE_NAME};

use crate::config_data::write_sample_cfg;

pub(crate) fn open_config(cfg_path: Option<PathBuf>) -> Result<Config> {
    let config_path = match cfg_path.or_else(find_config_path) {
        Some(path) => path,
        None => return Err(anyhow!("Could not find {}", CFG_FILE_NAME)),
    };

    if let Ok(cur_dir) = env::current_dir() {
        println!("Current dir: {}", cur_dir.display());
    }
    println!("Reading config from {}", config_path.display());
    let mut config = read_config(&config_path)
        .with_context(|| format!("Could not load {}", config_path.display()))?;

    if let Some(mut log) = config.log {
        if log.location.is_none() {
            log.location = dirs::cache_dir().map(|dir| dir.join("Weekly").join("log").join("server.log"));
        }
        match log.location {
            Some(ref location) => println!("Log enabled. Files will be written in {}", location.display()),
            None => println!("Log enabled. No cache directory found, using the console"),
        }
        config.log = Some(log);
    } else {
        println!("Log disabled. Using stdout");
    }

    Ok(config)
}

pub(crate) fn generate_cfg(config_path: &Option<PathBuf>) -> Result<PathBuf> {
    let path: PathBuf = match config_path {
        Some(path) => path.clone(),
        None => dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not find user config dir"))?
            .join("weekly")
            .join(CFG_FILE_NAME),
    };

    println!("Writing sample config to {}", path.display());
    write_sample_cfg(&path)?;

    Ok(path)
}
