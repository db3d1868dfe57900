//! `linktitle resolve`: run one batch through the full pipeline and print it.

use std::sync::Arc;

use anyhow::Result;
use linktitle_config::ServiceConfig;
use linktitle_security::SafeTransport;

use crate::app::{build_cache, build_manager};
use crate::terminal_output::{dim, note_success, note_warn, render_table, Column};

pub async fn run(config: &ServiceConfig, urls: Vec<String>, video_ids: Vec<String>, json: bool) -> Result<()> {
    if urls.is_empty() && video_ids.is_empty() {
        note_warn("Nothing to resolve; pass URLs or --video-id");
        return Ok(());
    }

    let cache = build_cache(config)?;
    let manager = Arc::new(build_manager(config, cache, &SafeTransport::new())?);

    let by_url = manager.resolve_multi(&urls).await;
    let by_id = manager.resolve_legacy_ids(&video_ids).await;

    if json {
        let out = serde_json::json!({ "results": by_url, "videoIds": by_id });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let mut rows = Vec::with_capacity(urls.len() + video_ids.len());
    for url in &urls {
        rows.push(match by_url.get(url) {
            Some(result) => vec![url.clone(), result.platform.clone(), result.title.clone()],
            None => vec![url.clone(), dim("-"), dim("(unresolved)")],
        });
    }
    for id in &video_ids {
        rows.push(match by_id.get(id) {
            Some(title) => vec![id.clone(), "video id".to_string(), title.clone()],
            None => vec![id.clone(), dim("-"), dim("(unresolved)")],
        });
    }

    let columns = [
        Column::new("Key").max_width(60),
        Column::new("Platform"),
        Column::new("Title").max_width(80),
    ];
    print!("{}", render_table(&columns, &rows));
    note_success(&format!(
        "{} of {} resolved",
        by_url.len() + by_id.len(),
        rows.len()
    ));
    Ok(())
}
