//! Точка входа `atsd-push`.
//!
//! Жизненный цикл:
//! - парсинг CLI и подключение к ATSD (`StreamClient::connect`)
//! - фоновый flush буфера раз в `--flush-interval-ms`
//! - отправка команд из файла/stdin или демо-генератора
//! - финальный flush и close по концу ввода или `Ctrl+C`

mod cli;
mod flusher;
mod generator;
mod input;
mod push;

use std::sync::{Arc, atomic::AtomicBool, atomic::Ordering};

use anyhow::Context;
use atsd_stream::StreamClient;
use clap::Parser;
use log::{info, warn};

use crate::flusher::Flusher;
use crate::generator::{DemoGenerator, GeneratorConfig};

fn main() -> anyhow::Result<()> {
    // Логи через RUST_LOG=info/debug
    env_logger::init();

    let shutdown = Arc::new(AtomicBool::new(false));

    // Ctrl+C => shutdown=true; второй Ctrl+C, если ждём stdin, — выходим сразу
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            if shutdown.swap(true, Ordering::Relaxed) {
                warn!("second interrupt, exiting without flush");
                std::process::exit(130);
            }
            info!("shutting down...");
        })?;
    }

    let args = cli::Args::parse();
    args.validate()?;

    let config = args.stream_config();
    info!(
        "Starting atsd-push: server={}://{}, buffer={}, flush_interval={:?}",
        config.protocol,
        config.address,
        config.buffer_size,
        args.flush_interval()
    );

    let client = Arc::new(
        StreamClient::connect(&config)
            .with_context(|| format!("connect to {}://{}", config.protocol, config.address))?,
    );
    let flusher = Flusher::spawn(client.clone(), args.flush_interval(), shutdown.clone());

    let sent = if args.demo {
        let mut generator = DemoGenerator::new(
            cli::parse_csv(&args.entities),
            cli::parse_csv(&args.metrics),
            GeneratorConfig::default(),
        );
        push::run_demo(&*client, &mut generator, args.demo_interval(), &shutdown)
    } else {
        match args.input.as_deref() {
            Some(path) => input::open_input(path)
                .map_err(anyhow::Error::from)
                .and_then(|commands| push::push_commands(&*client, commands, &shutdown)),
            None => Err(anyhow::anyhow!("no command source")),
        }
    };

    // сначала гасим фоновый flush, потом последний flush и close
    let periodic = flusher.stop();
    let last = client.flush().context("final flush");
    client.close();

    let sent = sent?;
    periodic?;
    last?;

    info!("sent {sent} commands");
    Ok(())
}
