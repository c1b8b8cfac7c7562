use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use recall_lib::catalog::ItemId;
use recall_lib::clock::SystemClock;
use recall_lib::deck::{FilterMode, SortStrategy};
use recall_lib::practice::{countdown_with_step, PracticeError};
use recall_lib::session::{SessionView, StudySession};

use crate::app::App;

/// Hands-free review of one deck; Ctrl-C stops it
pub async fn run(
    app: &App,
    strategy: SortStrategy,
    filter: &FilterMode,
    seed: Option<u64>,
) -> Result<()> {
    let deck = app.build_deck(strategy, filter, seed)?;
    if deck.items.is_empty() {
        println!("(empty deck)");
        return Ok(());
    }

    let labels: HashMap<ItemId, String> = app
        .items()
        .iter()
        .map(|item| (item.id.clone(), item.label.clone()))
        .collect();

    let practice = app.config.practice;
    let cancel = CancellationToken::new();
    let ready = countdown_with_step(
        Duration::from_millis(practice.tick_delay_ms),
        Duration::from_millis(practice.countdown_tick_ms),
        &cancel,
        Some(|_elapsed: Duration, remaining: Duration| {
            print!("\rstarting in {:.1}s ", remaining.as_secs_f64());
            let _ = std::io::stdout().flush();
        }),
    );
    tokio::select! {
        result = ready => result?,
        _ = tokio::signal::ctrl_c() => {
            cancel.cancel();
            println!();
            return Ok(());
        }
    }
    println!();

    let mut session = StudySession::new(
        deck,
        &app.config,
        app.store.clone(),
        Arc::new(SystemClock),
        app.channel.clone(),
    );
    if let Some(view) = session.current() {
        print_view(&view, &labels);
    }

    let (done_tx, done_rx) = oneshot::channel();
    let started = session.start_timed_practice(
        move |view| {
            if let Some(view) = view {
                print_view(&view, &labels);
            }
        },
        move |result| {
            let _ = done_tx.send(result);
        },
    );
    if !started {
        bail!("Timed practice could not start");
    }

    let outcome = tokio::select! {
        outcome = done_rx => outcome,
        _ = tokio::signal::ctrl_c() => {
            session.abort();
            Ok(Err(PracticeError::UserAborted))
        }
    };

    session.close().await;

    match outcome {
        Ok(Ok(())) => println!("done"),
        Ok(Err(PracticeError::UserAborted)) => println!("stopped"),
        Ok(Err(e)) => bail!("Timed practice failed: {}", e),
        Err(_) => bail!("Timed practice ended without a result"),
    }
    Ok(())
}

fn print_view(view: &SessionView, labels: &HashMap<ItemId, String>) {
    let label = labels.get(&view.item_id).map(String::as_str).unwrap_or("?");
    let marker = if view.is_reinforced { "*" } else { " " };
    println!("{:>5.1}% {} {}", view.progress_percent, marker, label);
}
