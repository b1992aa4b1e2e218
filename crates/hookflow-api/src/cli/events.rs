//! `hookflow events`: the fixed event catalogue.

use anyhow::Result;
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};

use crate::state::AppState;

pub async fn list_events(state: &AppState, json: bool) -> Result<()> {
    let events = state.engine.available_events();

    let mut rows = Vec::with_capacity(events.len());
    for event in events {
        rows.push((*event, state.engine.subscribers(*event).await.len()));
    }

    if json {
        let out: Vec<_> = rows
            .iter()
            .map(|(event, subscribers)| {
                serde_json::json!({
                    "event": event.as_str(),
                    "description": event.description(),
                    "subscribers": subscribers,
                })
            })
            .collect();
        return super::print_json(&out);
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Event").fg(Color::Cyan),
            Cell::new("Description"),
            Cell::new("Workflows"),
        ]);

    for (event, subscribers) in &rows {
        table.add_row(vec![
            Cell::new(event.as_str()),
            Cell::new(event.description()),
            Cell::new(subscribers),
        ]);
    }

    println!();
    println!("{table}");
    println!();

    Ok(())
}
