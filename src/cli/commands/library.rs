//! Library import, lookup and random selection commands.

use std::io::Write;
use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::runtime::Runtime;

use super::{open_index, open_session};
use crate::config::Config;
use crate::library::{self, ImportEvent};
use crate::model::TrackRecord;

/// Import a directory of music files
pub fn cmd_scan(rt: &Runtime, db_path: Option<&Path>, path: &PathBuf) -> anyhow::Result<()> {
    rt.block_on(async {
        let index = open_index(db_path).await?;
        println!("Scanning directory: {:?}", path);

        let stream = library::import_library(index, path.clone());
        let mut stream = std::pin::pin!(stream);
        let mut count = 0;

        while let Some(event) = stream.next().await {
            match event {
                ImportEvent::Imported(..) => {
                    count += 1;
                    if count % 100 == 0 {
                        print!("\rImported {} tracks...", count);
                        std::io::stdout().flush()?;
                    }
                }
                ImportEvent::Error(p, e) => {
                    eprintln!("\nError processing {:?}: {}", p, e);
                }
            }
        }
        println!("\nScan complete. Total imported: {} tracks.", count);
        Ok::<_, anyhow::Error>(())
    })
}

/// Show a track's metadata
pub fn cmd_show(rt: &Runtime, db_path: Option<&Path>, config: &Config, id: i64) -> anyhow::Result<()> {
    rt.block_on(async {
        let session = open_session(db_path, config).await?;
        match session.track(id).await {
            Some(track) => print_track(&track),
            None => println!("Track {} not found", id),
        }
        Ok::<_, anyhow::Error>(())
    })
}

/// Pick random tracks
pub fn cmd_random(
    rt: &Runtime,
    db_path: Option<&Path>,
    config: &Config,
    count: usize,
) -> anyhow::Result<()> {
    rt.block_on(async {
        let session = open_session(db_path, config).await?;
        if !session.has_tracks().await {
            println!("No tracks in the library. Run `scan` first.");
            return Ok(());
        }

        for _ in 0..count {
            match session.random_track().await {
                Some(track) => println!(
                    "{:>6}  {} - {}",
                    track.id,
                    track.artist.as_deref().unwrap_or("Unknown Artist"),
                    track.title.as_deref().unwrap_or("Unknown Title"),
                ),
                None => println!("(no track)"),
            }
        }
        Ok::<_, anyhow::Error>(())
    })
}

fn print_track(track: &TrackRecord) {
    let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    println!("Id:       {}", track.id);
    println!("Title:    {}", show(&track.title));
    println!("Artist:   {}", show(&track.artist));
    println!("Album:    {} (#{})", show(&track.album), track.album_id);
    println!("Path:     {}", show(&track.path));
}
