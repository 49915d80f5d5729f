use tabled::Table;
use uuid::Uuid;

use crate::{
    error, info,
    management::{FileStore, LikesManager},
    success,
    types::AudioBlock,
    utils, warning,
};

pub(crate) async fn open_likes() -> LikesManager<FileStore> {
    let store = FileStore::default_location();
    match LikesManager::open(store).await {
        Ok(likes) => likes,
        Err(e) => error!("Cannot load likes. Err: {}", e),
    }
}

fn parse_id(raw: &str) -> Uuid {
    match utils::parse_audio_block_id(raw) {
        Ok(id) => id,
        Err(e) => error!("{}", e),
    }
}

/// Uses the stored record when the block is already known, otherwise builds
/// one from what was given on the command line.
fn resolve_block(
    likes: &LikesManager<FileStore>,
    id: Uuid,
    title: Option<String>,
    artist: Option<String>,
) -> AudioBlock {
    if let Some(known) = likes.get_liked_item(&id.to_string()) {
        return known.clone();
    }

    AudioBlock::new(
        id,
        title.unwrap_or_else(|| "Unknown title".to_string()),
        artist.unwrap_or_else(|| "Unknown artist".to_string()),
    )
}

pub async fn like(id: String, title: Option<String>, artist: Option<String>, spin: Option<String>) {
    let mut likes = open_likes().await;
    let block = resolve_block(&likes, parse_id(&id), title, artist);
    let label = format!("{} - {}", block.artist, block.title);

    match likes.like(block, spin).await {
        Ok(true) => success!("Liked {}.", label),
        Ok(false) => info!("{} is already liked.", label),
        Err(e) => error!("Cannot save like. Err: {}", e),
    }
}

pub async fn unlike(id: String, spin: Option<String>) {
    let mut likes = open_likes().await;
    let id = parse_id(&id);

    let Some(block) = likes.get_liked_item(&id.to_string()).cloned() else {
        info!("{} is not liked.", id);
        return;
    };
    let label = format!("{} - {}", block.artist, block.title);

    match likes.unlike(block, spin).await {
        Ok(_) => success!("Removed like for {}.", label),
        Err(e) => error!("Cannot save unlike. Err: {}", e),
    }
}

pub async fn toggle(
    id: String,
    title: Option<String>,
    artist: Option<String>,
    spin: Option<String>,
) {
    let mut likes = open_likes().await;
    let block = resolve_block(&likes, parse_id(&id), title, artist);
    let label = format!("{} - {}", block.artist, block.title);

    match likes.toggle_like(block, spin).await {
        Ok(true) => success!("Liked {}.", label),
        Ok(false) => success!("Removed like for {}.", label),
        Err(e) => error!("Cannot save like. Err: {}", e),
    }
}

pub async fn list_likes(search: Option<String>, check: Option<String>) {
    let likes = open_likes().await;

    if let Some(raw) = check {
        let id = parse_id(&raw).to_string();
        match likes.get_liked_item(&id) {
            Some(item) => match likes.get_liked_timestamp(&id) {
                Some(ts) => info!(
                    "{} - {} is liked (since {}).",
                    item.artist,
                    item.title,
                    utils::format_timestamp(ts)
                ),
                None => info!("{} - {} is liked.", item.artist, item.title),
            },
            None => info!("{} is not liked.", id),
        }
        return;
    }

    let mut items: Vec<(AudioBlock, _)> = likes
        .all_liked_items()
        .into_iter()
        .map(|item| {
            let ts = likes.get_liked_timestamp(&item.key());
            (item, ts)
        })
        .collect();

    if let Some(term) = search {
        let term = term.to_lowercase();
        items.retain(|(item, _)| {
            item.title.to_lowercase().contains(&term) || item.artist.to_lowercase().contains(&term)
        });
    }

    if items.is_empty() {
        warning!("No liked items found.");
        return;
    }

    let rows = utils::build_liked_rows(items);
    println!("{}", Table::new(rows));
}
