use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;

const CONFIG_SAMPLE: &str = r#"# For the file locations, If you want it to be relative to the executable directory
# use ${exe_dir}/location
[paths]
template_dir = "res/template"
public_dir = "res/public"

# store = "local" reads {local_dir}/{root}, store = "github" reads {root} in [github].repo
# WEEKLY_STORE=local|github overrides it
[content]
root = "content/weeks"
store = "local"
local_dir = "."

[github]
repo = "owner/journal"
branch = "main"
token_env = "GITHUB_TOKEN"

[defaults]
page_size = 10
cache_enabled = true
words_per_minute = 200
summary_length = 150
first_week = {{TODAY}}

[server]
address = "0.0.0.0"
port = 8001

# The admin API stays off until a password is set
[admin]
password_env = "ADMIN_PASSWORD"

[rss_feed]
title = "Weekly journal"
site_url = "http://localhost:8001"
description = "One post per week"
language = "en"
page_size = 20
"#;

pub(crate) fn write_sample_cfg(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, get_sample_cfg())
        .with_context(|| format!("Could not write {}", file_path.display()))
}

fn get_sample_cfg() -> String {
    let today = Local::now().format("%Y-%m-%d").to_string();
    CONFIG_SAMPLE.replace("{{TODAY}}", &today)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_is_valid() {
        let config = weekly::config::parse_config(&get_sample_cfg()).unwrap();
        assert_eq!(config.content.root, "content/weeks");
        assert!(config.defaults.first_week.is_some());
        assert!(config.admin.is_some());
    }
}
