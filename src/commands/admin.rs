use crate::commands::{describe, AppContext};
use crate::domain::models::{ActionCommand, ActionKind, ActionReport, FeedSnapshot, View};
use crate::services::dispatch::ActionDispatcher;
use crate::services::feed::{FeedConfig, FeedMode, FeedQuery, FeedSource, FeedSynchronizer};
use crate::services::output::{print_line, print_one, print_out, record_row};
use crate::services::policy::require_view;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::debug;

fn feed_view(analytics: bool) -> (View, FeedMode) {
    if analytics {
        (View::Analytics, FeedMode::Analytics)
    } else {
        (View::Dashboard, FeedMode::Applications)
    }
}

pub async fn show_feed(ctx: &AppContext, search: &str, analytics: bool) -> anyhow::Result<()> {
    let (view, mode) = feed_view(analytics);
    require_view(view, &ctx.store)?;
    let client = ctx.client()?;
    let page = client
        .fetch(&FeedQuery {
            search: search.to_string(),
            mode,
        })
        .await
        .map_err(describe)?;
    let snapshot = FeedSnapshot {
        sequence: 1,
        search: search.to_string(),
        records: page.records,
        stats: page.stats,
        threats: page.threats,
    };
    if ctx.json {
        print_one(true, snapshot, |_| String::new())
    } else {
        println!("{}", render_text(&snapshot));
        Ok(())
    }
}

fn render_text(snapshot: &FeedSnapshot) -> String {
    let mut out = format!("-- snapshot {}", snapshot.sequence);
    if !snapshot.search.is_empty() {
        out.push_str(&format!(" (search: {})", snapshot.search));
    }
    if let Some(s) = &snapshot.stats {
        out.push_str(&format!(
            "\ntotal={} clean={} blocked={} capital_preserved={:.2}",
            s.total, s.clean, s.blocked, s.capital_preserved
        ));
    }
    for t in snapshot.threats.iter().flatten() {
        out.push_str(&format!("\n{}\t{}", t.category, t.count));
    }
    for r in &snapshot.records {
        out.push('\n');
        out.push_str(&record_row(r));
    }
    out
}

/// One line typed into the live console.
#[derive(Debug, PartialEq, Eq)]
pub enum ConsoleInput {
    Search(String),
    Action(ActionCommand),
    Refresh,
    Quit,
    Invalid(String),
}

pub fn parse_console_line(line: &str) -> ConsoleInput {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return ConsoleInput::Search(line.to_string());
    };
    let mut parts = rest.split_whitespace();
    let verb = parts.next().unwrap_or_default();
    let kind = match verb {
        "approve" => ActionKind::Approve,
        "force" => ActionKind::ForceApprove,
        "flag" => ActionKind::FlagForInvestigation,
        "refresh" => return ConsoleInput::Refresh,
        "quit" | "exit" => return ConsoleInput::Quit,
        other => return ConsoleInput::Invalid(format!("unknown command: /{other}")),
    };
    match parts.next().map(str::parse::<i64>) {
        Some(Ok(target_id)) => ConsoleInput::Action(ActionCommand { target_id, kind }),
        _ => ConsoleInput::Invalid(format!("usage: /{verb} <id>")),
    }
}

fn emit(json: bool, snapshot: &FeedSnapshot) -> anyhow::Result<()> {
    if json {
        print_line(snapshot)
    } else {
        println!("{}", render_text(snapshot));
        Ok(())
    }
}

pub async fn watch_feed(
    ctx: &AppContext,
    search: &str,
    interval_secs: Option<u64>,
    ticks: Option<u64>,
    analytics: bool,
) -> anyhow::Result<()> {
    let (view, mode) = feed_view(analytics);
    require_view(view, &ctx.store)?;
    let interval = match interval_secs {
        Some(0) => anyhow::bail!("--interval-secs must be at least 1"),
        Some(secs) => Duration::from_secs(secs),
        None => ctx.config.refresh_interval(),
    };

    let client = Arc::new(ctx.client()?);
    let feed = FeedSynchronizer::start(client.clone(), FeedConfig { interval, mode }, search);
    let dispatcher = ActionDispatcher::new(client);
    let mut updates = feed.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut shown = 0u64;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = updates.borrow_and_update().clone();
                if let Some(snapshot) = latest {
                    emit(ctx.json, &snapshot)?;
                    shown += 1;
                    if ticks.is_some_and(|limit| shown >= limit) {
                        break;
                    }
                }
            }
            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if !handle_console_line(&feed, &dispatcher, &line).await {
                        break;
                    }
                }
                Ok(None) | Err(_) => stdin_open = false,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    feed.unmount();
    Ok(())
}

/// Returns `false` when the console should close.
async fn handle_console_line(
    feed: &FeedSynchronizer,
    dispatcher: &ActionDispatcher,
    line: &str,
) -> bool {
    match parse_console_line(line) {
        ConsoleInput::Search(term) => {
            let sequence = feed.set_search(term);
            debug!(?sequence, "search updated");
        }
        ConsoleInput::Refresh => {
            feed.refresh();
        }
        ConsoleInput::Quit => return false,
        ConsoleInput::Action(command) => match dispatcher.dispatch(command, feed).await {
            Ok(done) => eprintln!(
                "{}: {}",
                command.target_id,
                done.ack.message.as_deref().unwrap_or("done")
            ),
            Err(err) => eprintln!("action on {} failed: {err}", command.target_id),
        },
        ConsoleInput::Invalid(msg) => eprintln!("{msg}"),
    }
    true
}

async fn wait_for_sequence(
    updates: &mut watch::Receiver<Option<Arc<FeedSnapshot>>>,
    sequence: u64,
    limit: Duration,
) -> Option<Arc<FeedSnapshot>> {
    let wait = async {
        loop {
            let current = updates.borrow_and_update().clone();
            if let Some(snapshot) = current.filter(|s| s.sequence >= sequence) {
                return Some(snapshot);
            }
            if updates.changed().await.is_err() {
                return None;
            }
        }
    };
    tokio::time::timeout(limit, wait).await.ok().flatten()
}

pub async fn act(ctx: &AppContext, id: i64, action: ActionKind) -> anyhow::Result<()> {
    require_view(View::Dashboard, &ctx.store)?;
    let client = Arc::new(ctx.client()?);
    let feed = FeedSynchronizer::start(
        client.clone(),
        FeedConfig {
            interval: ctx.config.refresh_interval(),
            mode: FeedMode::Applications,
        },
        "",
    );
    let mut updates = feed.subscribe();
    let dispatcher = ActionDispatcher::new(client);

    let command = ActionCommand {
        target_id: id,
        kind: action,
    };
    let dispatched = dispatcher.dispatch(command, &feed).await.map_err(describe)?;
    let record = match dispatched.refresh_sequence {
        Some(sequence) => wait_for_sequence(&mut updates, sequence, ctx.config.request_timeout())
            .await
            .and_then(|s| s.records.iter().find(|r| r.id == id).cloned()),
        None => None,
    };
    feed.unmount();

    let report = ActionReport {
        target_id: id,
        action,
        ack: dispatched.ack,
        record,
    };
    print_one(ctx.json, report, |r| {
        let message = r.ack.message.as_deref().unwrap_or("action applied");
        match &r.record {
            Some(rec) => format!("{message}\n{}", record_row(rec)),
            None => message.to_string(),
        }
    })
}

pub async fn stats(ctx: &AppContext) -> anyhow::Result<()> {
    require_view(View::Dashboard, &ctx.store)?;
    let stats = ctx.client()?.stats().await.map_err(describe)?;
    print_one(ctx.json, stats, |s| {
        format!(
            "total={} clean={} blocked={} capital_preserved={:.2}",
            s.total, s.clean, s.blocked, s.capital_preserved
        )
    })
}

pub async fn threats(ctx: &AppContext) -> anyhow::Result<()> {
    require_view(View::Analytics, &ctx.store)?;
    let threats = ctx.client()?.threat_analytics().await.map_err(describe)?;
    print_out(ctx.json, &threats, |t| format!("{}\t{}", t.category, t.count))
}

pub async fn users(ctx: &AppContext) -> anyhow::Result<()> {
    require_view(View::Citizens, &ctx.store)?;
    let users = ctx.client()?.list_users().await.map_err(describe)?;
    print_out(ctx.json, &users, |u| format!("{}\t{}\t{}", u.id, u.username, u.role))
}
