//! Scan command implementation.

use medqr_core::scanlog::{CsvLogStore, JsonLinesLogStore, Mirrored};
use medqr_core::{Config, LogStore, ScanEvent, ScanRecorder, ScanStatus};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::args::ScanArgs;
use crate::ui::{print_banner, print_warnings};

/// Log every scan typed on stdin until Ctrl+C or end of input.
pub async fn scan(args: ScanArgs, config: &Config) -> anyhow::Result<()> {
    print_banner();

    let log_path = args.log.clone().unwrap_or_else(|| config.log_path());
    let csv = CsvLogStore::open(&log_path)?;
    let store: Box<dyn LogStore> = match &args.mirror {
        Some(path) => Box::new(Mirrored::new(csv, JsonLinesLogStore::open(path)?)),
        None => Box::new(csv),
    };
    let mut recorder = ScanRecorder::new(store);
    tracing::info!("scan log opened at {}", log_path.display());

    println!("\x1b[1mLog:\x1b[0m    {}", log_path.display());
    if let Some(path) = &args.mirror {
        println!("\x1b[1mMirror:\x1b[0m {}", path.display());
    }
    println!("\n\x1b[1;32m✓\x1b[0m Ready, scan a label...");
    if args.multiline {
        println!("\x1b[2mEnd each scan with an empty line.\x1b[0m");
    }
    println!("\x1b[2mPress Ctrl+C to stop.\x1b[0m\n");

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::mpsc::channel::<()>(1);
    ctrlc::set_handler(move || {
        let _ = tx.blocking_send(());
    })?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending: Vec<String> = Vec::new();
    let mut interrupted = false;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // End of input flushes a half-finished multi-line scan
                    if !pending.is_empty() {
                        handle_scan(&mut recorder, &pending.join("\n"))?;
                    }
                    break;
                };
                let line = line.trim_end_matches('\r');

                if !args.multiline {
                    if !line.trim().is_empty() {
                        handle_scan(&mut recorder, line)?;
                    }
                } else if line.trim().is_empty() {
                    if !pending.is_empty() {
                        handle_scan(&mut recorder, &pending.join("\n"))?;
                        pending.clear();
                    }
                } else {
                    pending.push(line.to_string());
                }
            }
            _ = rx.recv() => {
                println!("\n\x1b[1;33mShutting down...\x1b[0m");
                interrupted = true;
                break;
            }
        }
    }

    println!("{} scan(s) logged to {}", recorder.recorded(), log_path.display());

    if interrupted {
        // The blocking stdin read can't be cancelled and would hold up runtime shutdown.
        // Every scan is already flushed.
        std::process::exit(0);
    }
    Ok(())
}

/// Record one scan and print what was read.
fn handle_scan<S: LogStore>(recorder: &mut ScanRecorder<S>, raw: &str) -> anyhow::Result<()> {
    let event = recorder.record(raw)?;
    print_event(&event);
    Ok(())
}

fn print_event(event: &ScanEvent) {
    match event.status {
        ScanStatus::Parsed | ScanStatus::Partial => {
            let record = &event.record;
            println!(
                "\x1b[1;32m⬤\x1b[0m {} \x1b[1m{}\x1b[0m  lote {}  vence {}",
                event.timestamp,
                record.display_name(),
                or_dash(&record.batch),
                or_dash(&record.expiry_date)
            );
        }
        ScanStatus::Failed => {
            println!("\x1b[1;31m⬤\x1b[0m {} unrecognized scan logged raw", event.timestamp);
        }
    }
    print_warnings(&event.warnings);
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
