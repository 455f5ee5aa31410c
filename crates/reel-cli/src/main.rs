//! reel CLI: terminal status viewer powered by reel-core.
//!
//! Commands:
//!   reel play <queue.json> [start]   View a queue from `start` (default 0)
//!   reel play <queue.json> --id <id> View a queue from the item with `id`
//!   reel check <queue.json>          Validate a queue, print durations
//!
//! While playing, stdin takes one command per line:
//!   l / c / r        Tap left, centre, right third
//!   tap <x>          Tap at x in 0.0..1.0
//!   p                Toggle pause
//!   reply <text>     Open the reply box and send `text`
//!   {"action": ..}   Raw command JSON
//!   q                Close the viewer

use std::io::{BufRead, Write};
use std::thread;

use crossbeam_channel::{never, select, unbounded, Receiver};
use reel_core::reply::PREVIEW_LIMIT;
use reel_core::{
    ItemKind, Session, Snapshot, UpdateItem, UpdateQueue, ViewerCommand, ViewerConfig,
    ViewerResult,
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        return;
    }

    let config = ViewerConfig::from_env();

    match args[0].as_str() {
        "play" => cmd_play(&config, &args[1..]),
        "check" => cmd_check(&config, &args[1..]),
        other => {
            eprintln!("unknown command: {}", other);
            print_usage();
        }
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_play(config: &ViewerConfig, args: &[String]) {
    if args.is_empty() {
        eprintln!("usage: reel play <queue.json> [start | --id <id>]");
        return;
    }
    let start = match (args.get(1).map(String::as_str), args.get(2)) {
        (None, _) => Start::Index(0),
        (Some("--id"), Some(id)) => Start::Id(id.clone()),
        (Some("--id"), None) => {
            eprintln!("usage: reel play <queue.json> --id <id>");
            return;
        }
        (Some(n), _) => match n.parse::<usize>() {
            Ok(n) => Start::Index(n),
            Err(_) => {
                eprintln!("invalid start index: {}", n);
                return;
            }
        },
    };

    let queue = match UpdateQueue::load(&args[0], config) {
        Ok(q) => q,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };
    log::debug!("reel: loaded {} items from {}", queue.len(), args[0]);
    let authors: Vec<String> = queue.items().iter().map(label).collect();

    let opened = match start {
        Start::Index(n) => Session::open(queue, n, *config),
        Start::Id(id) => Session::open_at_id(queue, &id, *config),
    };
    let session = match opened {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            return;
        }
    };
    let snapshots = session.subscribe();
    session.start();

    let mut lines = spawn_stdin_reader();
    let mut shown: Option<(usize, usize)> = None;

    // Render every snapshot; stop once the viewer closes
    loop {
        select! {
            recv(snapshots.receiver()) -> msg => match msg {
                Ok(snap) => {
                    let key = (snap.current_index, snap.reply_count);
                    if shown != Some(key) && !snap.closed {
                        print_replies(&session, snap.current_index);
                        shown = Some(key);
                    }
                    print_progress(&snap, &authors);
                    if snap.closed {
                        break;
                    }
                }
                Err(_) => break,
            },
            recv(lines) -> msg => match msg {
                Ok(line) => {
                    if let Err(e) = run_line(&session, line.trim()) {
                        eprintln!("\n{}", e);
                    }
                }
                Err(_) => {
                    session.on_request_close().ok();
                    lines = never();
                }
            },
        }
    }
    println!();

    let seen = session.seen_ids();
    println!("seen {} of {}: {}", seen.len(), authors.len(), seen.join(", "));
    session.shutdown();
}

fn cmd_check(config: &ViewerConfig, args: &[String]) {
    if args.is_empty() {
        eprintln!("usage: reel check <queue.json>");
        return;
    }
    match UpdateQueue::load(&args[0], config) {
        Ok(queue) => {
            for (i, item) in queue.items().iter().enumerate() {
                println!(
                    "{:>3}  {:<16} {:<6} {:>6}  replies: {}",
                    i,
                    item.id,
                    match item.kind {
                        ItemKind::Static => "static",
                        ItemKind::Video => "video",
                    },
                    fmt_time(item.duration_ms),
                    item.replies.len(),
                );
            }
            println!("ok: {} items", queue.len());
        }
        Err(e) => {
            eprintln!("invalid queue: {}", e);
            std::process::exit(1);
        }
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(l) => {
                    if tx.send(l).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });
    rx
}

fn run_line(session: &Session, line: &str) -> ViewerResult<()> {
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    match word {
        "" => Ok(()),
        "l" => session.on_tap(0.5, 3.0).map(drop),
        "c" => session.on_tap(1.5, 3.0).map(drop),
        "r" => session.on_tap(2.5, 3.0).map(drop),
        "p" => session.toggle_pause().map(drop),
        "tap" => match rest.trim().parse::<f32>() {
            Ok(x) => session.on_tap(x, 1.0).map(drop),
            Err(_) => {
                eprintln!("\nusage: tap <0.0-1.0>");
                Ok(())
            }
        },
        "reply" => {
            session.on_reply_open()?;
            session.on_reply_submit(rest).map(drop)
        }
        "q" => session.on_request_close(),
        _ if line.starts_with('{') => match serde_json::from_str::<ViewerCommand>(line) {
            Ok(cmd) => session.command(cmd),
            Err(e) => {
                eprintln!("\nbad command json: {}", e);
                Ok(())
            }
        },
        other => {
            eprintln!("\nunknown input: {}", other);
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

enum Start {
    Index(usize),
    Id(String),
}

fn label(item: &UpdateItem) -> String {
    if item.author.is_empty() {
        item.id.clone()
    } else {
        item.author.clone()
    }
}

/// Reply preview for the item on screen, "+N more" when trimmed.
fn print_replies(session: &Session, index: usize) {
    let preview = match session.replies_preview(index, PREVIEW_LIMIT) {
        Some(p) => p,
        None => return,
    };
    if preview.shown.is_empty() {
        return;
    }
    println!();
    for reply in &preview.shown {
        println!("    > {}", reply.text);
    }
    if preview.more > 0 {
        println!("    +{} more replies", preview.more);
    }
}

/// One segment per item, filled by its progress ratio.
fn print_progress(snap: &Snapshot, authors: &[String]) {
    let seg_width = (48 / snap.progress_ratios.len().max(1)).clamp(2, 12);
    let bars: Vec<String> = snap
        .progress_ratios
        .iter()
        .map(|r| {
            let filled = ((*r as f64) * seg_width as f64) as usize;
            format!("{}{}", "=".repeat(filled), " ".repeat(seg_width - filled.min(seg_width)))
        })
        .collect();

    let who = authors
        .get(snap.current_index)
        .map(String::as_str)
        .unwrap_or("?");

    print!(
        "\r  [{}] {}  {} / {} (-{})  {:<9} replies: {}    ",
        bars.join("|"),
        who,
        fmt_time(snap.elapsed_ms),
        fmt_time(snap.duration_ms),
        fmt_time(snap.remaining_ms()),
        format!("{:?}", snap.state).to_lowercase(),
        snap.reply_count,
    );
    std::io::stdout().flush().ok();
}

fn fmt_time(ms: u64) -> String {
    let secs = ms / 1000;
    format!("{}:{:02}", secs / 60, secs % 60)
}

fn print_usage() {
    println!("reel - terminal status viewer");
    println!();
    println!("usage: reel <command> [args]");
    println!();
    println!("commands:");
    println!("  play <queue.json> [start]   View a queue from an index");
    println!("  play <queue.json> --id <id> View a queue from an item id");
    println!("  check <queue.json>          Validate a queue file");
    println!();
    println!("while playing: l | c | r | tap <x> | p | reply <text> | q");
    println!("config: REEL_CONFIG=<file.json> (default_duration_ms, tick_interval_ms)");
}
