//! Cover art command.

use std::path::Path;

use tokio::runtime::Runtime;

use super::open_session;
use crate::config::Config;

/// Resolve and optionally export a track's cover
pub fn cmd_cover(
    rt: &Runtime,
    db_path: Option<&Path>,
    config: &Config,
    id: i64,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let session = open_session(db_path, config).await?;

        let Some(track) = session.track(id).await else {
            println!("Track {} not found", id);
            return Ok(());
        };

        let Some(cover) = session.cover(&track).await else {
            println!("No cover art for track {}", id);
            return Ok(());
        };

        println!(
            "Cover: {}x{} from {:?} ({} bytes decoded)",
            cover.width(),
            cover.height(),
            cover.source(),
            cover.byte_size()
        );

        if let Some(out) = out {
            cover.save(out)?;
            println!("Saved to {}", out.display());
        }
        Ok::<_, anyhow::Error>(())
    })
}
