use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use atsd_stream::{DEFAULT_BUFFER_SIZE, Protocol, StreamConfig};
use clap::{ArgGroup, Parser};

/// ATSD Push - отправка команд series/property/entity-tag в ATSD по потоковому протоколу.
///
/// Команды берутся из файла (по одной на строку) или генерируются в демо-режиме.
/// Буфер сбрасывается в сокет раз в --flush-interval-ms и при завершении.
#[derive(Parser, Debug, Clone)]
#[command(name = "atsd-push", version, about)]
#[command(
    group(
        ArgGroup::new("source")
            .required(true)
            .args(["input", "demo"])
    )
)]
pub(crate) struct Args {
    /// Адрес ATSD, например 127.0.0.1:8081 или atsd.example.com:8081 (для unix — путь к сокету)
    #[arg(long)]
    pub(crate) server: String,

    /// Транспорт: tcp, tcp4, tcp6, udp, udp4, udp6, unix
    #[arg(long, default_value = "tcp")]
    pub(crate) protocol: Protocol,

    /// Ёмкость буфера записи в байтах (0 — каждая команда сразу в сокет)
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE)]
    pub(crate) buffer_size: usize,

    /// Таймаут подключения, мс
    #[arg(long, default_value_t = 5000)]
    pub(crate) dial_timeout_ms: u64,

    /// Таймаут блокирующей записи в сокет, мс
    #[arg(long)]
    pub(crate) write_timeout_ms: Option<u64>,

    /// Период сброса буфера, мс
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    pub(crate) flush_interval_ms: u64,

    /// Файл с командами (по одной на строку, # — комментарий); "-" — stdin.
    /// Нельзя вместе с --demo
    #[arg(long, conflicts_with = "demo")]
    pub(crate) input: Option<PathBuf>,

    /// Демо-режим: случайные series для --entities x --metrics до Ctrl+C
    #[arg(long, conflicts_with = "input")]
    pub(crate) demo: bool,

    /// Сущности для демо-режима, например "host-1,host-2"
    #[arg(long, default_value = "demo-host")]
    pub(crate) entities: String,

    /// Метрики для демо-режима, например "cpu_busy,mem_used"
    #[arg(long, default_value = "cpu_busy,mem_used")]
    pub(crate) metrics: String,

    /// Период генерации в демо-режиме, мс
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    pub(crate) interval_ms: u64,
}

impl Args {
    /// Валидация аргументов (файл существует, server выглядит как HOST:PORT и т.д.)
    pub(crate) fn validate(&self) -> Result<()> {
        if self.server.trim().is_empty() {
            bail!("--server is empty");
        }
        if !self.protocol.is_unix() && !self.server.contains(':') {
            bail!("--server must look like HOST:PORT (got: {})", self.server);
        }

        if let Some(path) = self.input.as_ref().filter(|p| !is_stdin(p)) {
            let md = std::fs::metadata(path)
                .with_context(|| format!("input file not found: {:?}", path))?;
            if !md.is_file() {
                bail!("--input must point to a file: {:?}", path);
            }
        }

        if self.demo {
            if parse_csv(&self.entities).is_empty() {
                bail!("--entities is empty");
            }
            if parse_csv(&self.metrics).is_empty() {
                bail!("--metrics is empty");
            }
        }

        Ok(())
    }

    pub(crate) fn stream_config(&self) -> StreamConfig {
        let mut config = StreamConfig::new(self.server.trim());
        config.protocol = self.protocol;
        config.buffer_size = self.buffer_size;
        config.dial_timeout = Duration::from_millis(self.dial_timeout_ms);
        config.write_timeout = self.write_timeout_ms.map(Duration::from_millis);
        config
    }

    pub(crate) fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub(crate) fn demo_interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// "-" вместо пути означает stdin
pub(crate) fn is_stdin(path: &std::path::Path) -> bool {
    path.as_os_str() == "-"
}

/// Парсит список из строки вида "host-1, host-2, ,host-1".
/// Пустые элементы игнорируются, результат отсортирован и уникален.
pub(crate) fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
