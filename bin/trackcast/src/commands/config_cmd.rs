use std::path::Path;

use trackcast_core::Config;

pub fn show(config_path: &Path) -> anyhow::Result<()> {
    let config = Config::load(config_path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

pub fn init(config_path: &Path, force: bool) -> anyhow::Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }
    Config::default().save(config_path)?;
    println!("Wrote {}", config_path.display());
    Ok(())
}
