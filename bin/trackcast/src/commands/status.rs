use std::path::Path;

use trackcast_core::{Config, Error};
use trackcast_monitor::{
    extractor, select_target, CdpSessionFactory, HttpTargetSource, SessionFactory, TargetSource,
};

pub async fn run(config_path: &Path) -> anyhow::Result<()> {
    let config = Config::load(config_path)?;

    println!("trackcast status");
    println!("================");
    println!();
    println!("Time:     {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("Endpoint: {}", config.endpoint.list_url());

    let source = HttpTargetSource::new(config.endpoint.list_url());
    let targets = match source.list_targets().await {
        Ok(targets) => targets,
        Err(Error::Unreachable(e)) => {
            println!("Browser:  ✗ unreachable ({})", e);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    println!("Browser:  ✓ reachable, {} target(s)", targets.len());

    let Some(target) = select_target(
        &targets,
        &config.monitor.origin,
        &config.monitor.service_worker_path,
    ) else {
        println!("Tab:      ✗ no qualifying tab under {}", config.monitor.origin);
        return Ok(());
    };
    println!("Tab:      ✓ {} ({})", target.url, target.id);

    match CdpSessionFactory.open(target).await {
        Ok(session) => {
            match extractor::extract(session.as_ref()).await {
                Ok(Some(snapshot)) => {
                    println!(
                        "Playback: {} — {} [{}] {}",
                        snapshot.artist,
                        snapshot.title,
                        snapshot.album,
                        if snapshot.paused { "paused" } else { "playing" }
                    );
                }
                Ok(None) => println!("Playback: no active track"),
                Err(e) => println!("Playback: extraction failed ({})", e),
            }
            session.close();
        }
        Err(e) => println!("Session:  ✗ connect failed ({})", e),
    }

    Ok(())
}
