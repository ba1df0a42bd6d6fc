use anyhow::{anyhow, Result};

use weekly::blog::Blog;
use weekly::config::Config;

pub(crate) async fn check_cmd(config: &Config) -> Result<()> {
    let blog = Blog::from_config(config)?;
    let assembly = blog.read_all().await;

    if let Some(ref e) = assembly.store_error {
        return Err(anyhow!("Could not read {}: {:?}", blog.root_dir(), e));
    }

    println!("{} posts in {}", assembly.collection.len(), blog.root_dir());
    for warning in &assembly.warnings {
        println!("warning: {}", warning);
    }
    for skipped in &assembly.skipped {
        println!("skipped: {}", skipped);
    }

    if !assembly.skipped.is_empty() {
        return Err(anyhow!("{} post(s) could not be read", assembly.skipped.len()));
    }
    Ok(())
}
