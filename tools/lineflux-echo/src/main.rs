// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! lineflux-echo - Echo decoded Line Protocol records from an MQTT topic
//!
//! Like `rostopic echo` but for Line Protocol over MQTT.

use chrono::Local;
use clap::Parser;
use colored::*;
use lineflux::{DecodedRecord, MqttTransport, QoS, Subscriber};
use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Echo decoded Line Protocol records from an MQTT topic
#[derive(Parser, Debug)]
#[command(name = "lineflux-echo")]
#[command(version = "0.1.0")]
#[command(about = "Echo decoded Line Protocol records from an MQTT topic")]
struct Args {
    /// Topic filter to subscribe to (e.g. "home/#")
    topic: String,

    /// Broker host name or address
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Broker port
    #[arg(short, long, default_value = "1883")]
    port: u16,

    /// QoS level: 0, 1 or 2
    #[arg(short, long, default_value = "2")]
    qos: u8,

    /// MQTT client identifier
    #[arg(long, default_value = "lineflux-echo")]
    client_id: String,

    /// Maximum number of records to receive (0 = unlimited)
    #[arg(short = 'n', long, default_value = "0")]
    count: u64,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Quiet mode - only output records, no headers
    #[arg(short = 'Q', long)]
    quiet: bool,
}

fn main() {
    // Initialize logger for RUST_LOG-based debug output
    env_logger::init();

    let args = Args::parse();

    if args.no_color || !io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    if let Err(e) = run_echo(&args) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run_echo(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let qos = QoS::from_u8(args.qos).ok_or(lineflux::Error::InvalidQos(args.qos))?;

    let transport = MqttTransport::connect(&args.host, args.port, &args.client_id)?;
    let mut subscriber = Subscriber::new(transport, args.topic.clone(), qos, ());

    // Setup Ctrl+C handler
    let stop = subscriber.stop_handle();
    let ctrlc_stop = stop.clone();
    ctrlc::set_handler(move || ctrlc_stop.stop())?;

    let received = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&received);
    let max_records = args.count;
    subscriber.set_handler(move |record, _| {
        let count = counter.fetch_add(1, Ordering::SeqCst) + 1;
        print_record(record, count);
        let _ = io::stdout().flush();
        if max_records > 0 && count >= max_records {
            stop.stop();
        }
    });

    if !args.quiet {
        print_header(args);
    }

    subscriber.run()?;

    if !args.quiet {
        let total = received.load(Ordering::SeqCst);
        let skipped = subscriber.stats().lines_rejected;
        eprintln!(
            "\n{} Received {} record(s), skipped {} malformed line(s)",
            "---".dimmed(),
            total,
            skipped
        );
    }

    subscriber.close()?;
    Ok(())
}

fn print_header(args: &Args) {
    eprintln!(
        "{} {} {} ({}:{}, qos={})",
        ">>>".green().bold(),
        "Subscribing to".bold(),
        args.topic.cyan(),
        args.host,
        args.port,
        args.qos
    );
    eprintln!("{}", "Press Ctrl+C to stop".dimmed());
    eprintln!();
}

fn print_record(record: &DecodedRecord, seq: u64) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");

    println!(
        "{} {} {}",
        format!("[{}]", timestamp).dimmed(),
        format!("#{}", seq).yellow(),
        record.measurement.cyan().bold()
    );
    for (key, value) in record.tags.iter() {
        println!("  {} {}={}", "tag".green(), key, value);
    }
    for (key, value) in &record.fields {
        println!("  {} {}={}", "field".blue(), key, value);
    }
    println!("  {} {}", "ts".magenta(), record.timestamp_ns);
    println!();
}
