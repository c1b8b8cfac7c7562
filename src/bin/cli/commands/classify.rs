use anyhow::{Context, Result};
use chrono::Utc;

use recall_lib::catalog::{CatalogItem, CatalogProvider, ItemId};

use crate::app::App;
use crate::render::terminal::{render_recall, state_name};
use crate::OutputFormat;

pub fn run(app: &App, id: Option<&str>, format: &OutputFormat, use_color: bool) -> Result<()> {
    let items: Vec<CatalogItem> = match id {
        Some(id) => vec![app
            .catalog
            .find(&ItemId::new(id))
            .context("Failed to look up item")?],
        None => app.items().to_vec(),
    };

    let classifier = app.classifier();
    let metadata = app.metadata();
    let now = Utc::now();

    match format {
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = items
                .iter()
                .map(|item| {
                    let recall = classifier.classify_metadata(metadata.get(&item.id), now);
                    serde_json::json!({
                        "id": item.id,
                        "label": item.label,
                        "state": state_name(recall.state),
                        "ratio": recall.ratio,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            for item in &items {
                let recall = classifier.classify_metadata(metadata.get(&item.id), now);
                println!("{}  {}", render_recall(&recall, use_color), item.label);
            }
        }
    }

    Ok(())
}
