use anyhow::Result;
use chrono::Utc;

use recall_lib::recall::stats::HISTOGRAM_BUCKETS;
use recall_lib::recall::RecallSummary;

use crate::app::App;
use crate::render::terminal::{paint, render_bar, Color};
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let metadata = app.metadata();
    let summary = RecallSummary::collect(
        &app.classifier(),
        app.items().iter().map(|item| metadata.get(&item.id)),
        Utc::now(),
    );

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Plain => {
            println!("{}", paint("Recall", Color::BOLD, use_color));
            let rows = [
                ("new", summary.new),
                ("seen", summary.seen_unreviewed),
                ("failed", summary.failed),
                ("today", summary.reviewed_today),
                ("pending", summary.pending),
                ("due", summary.due),
                ("overdue", summary.overdue),
            ];
            for (name, count) in rows {
                println!("  {:<8} {:>5}", name, count);
            }
            println!("  {:<8} {:>5}", "total", summary.total);
            println!("  {:<8} {:>5}", "pool", summary.reinforced);

            let max = summary.histogram.iter().copied().max().unwrap_or(0);
            if max > 0 {
                println!();
                println!("{}", paint("Overdue ratio", Color::BOLD, use_color));
                let step = app.config.classifier.ratio_ceiling / HISTOGRAM_BUCKETS as f64;
                for (bucket, count) in summary.histogram.iter().enumerate() {
                    let low = bucket as f64 * step;
                    println!(
                        "  {:>4.2}-{:<4.2} {:>5} {}",
                        low,
                        low + step,
                        count,
                        render_bar(*count, max, 40)
                    );
                }
            }

            if let Some(q) = summary.quartiles {
                println!(
                    "  q1 {:.2}  median {:.2}  q3 {:.2}",
                    q.q1, q.median, q.q3
                );
            }
        }
    }

    Ok(())
}
