use anyhow::Result;

use recall_lib::deck::{FilterMode, SortStrategy};

use crate::app::App;
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

pub fn run(
    app: &App,
    strategy: SortStrategy,
    filter: &FilterMode,
    seed: Option<u64>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let deck = app.build_deck(strategy, filter, seed)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&deck)?);
        }
        OutputFormat::Plain => {
            for group in &deck.dropped_groups {
                let note = format!("(dropped unknown group '{}')", group);
                println!("{}", paint(&note, Color::YELLOW, use_color));
            }

            if deck.items.is_empty() {
                println!("(empty deck)");
                return Ok(());
            }

            for (position, id) in deck.items.iter().enumerate() {
                let heading = deck
                    .alphabetic
                    .as_ref()
                    .filter(|index| index.labels.iter().any(|(_, start)| *start == position))
                    .and_then(|index| index.label_at(position));
                if let Some(label) = heading {
                    println!("{}", paint(label, Color::BOLD, use_color));
                }

                let marker = if deck.pool.contains(id) { "*" } else { " " };
                println!("{:>4} {} {}", position + 1, marker, app.label_of(id));
            }

            if !deck.overflow.is_empty() {
                let note = format!("{} more deferred to a later session", deck.overflow.len());
                println!("{}", paint(&note, Color::DIM, use_color));
            }
        }
    }

    Ok(())
}
