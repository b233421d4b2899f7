//! # atsd-stream
//!
//! Потоковый клиент ATSD: команды `series` / `property` / `entity-tag`
//! пишутся строками через буфер в одно долгоживущее соединение.
//!
//! - [`client`] — [`StreamClient`], публичная точка входа
//! - [`writer`] — буфер строк поверх сокета
//! - [`transport`] — dial по имени протокола, тип соединения
//! - [`config`] — параметры подключения
//!
//! ## Пример
//!
//! ```no_run
//! use std::time::Duration;
//! use atsd_core::SeriesCommand;
//! use atsd_stream::StreamClient;
//!
//! let client = StreamClient::dial_timeout("tcp", "atsd.local:8081", Duration::from_secs(5), 4096)?;
//! client.series(&SeriesCommand::new("host-1", "cpu_busy", 12.5).with_tag("dc", "eu"))?;
//! client.flush()?;
//! client.close();
//! # Ok::<(), atsd_stream::StreamError>(())
//! ```
//!
//! Сам клиент ничего не повторяет и не сбрасывает по таймеру: политика
//! (периодический flush, переподключение) строится поверх него.

#![forbid(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod transport;
pub mod writer;

pub use crate::client::StreamClient;
pub use crate::config::{DEFAULT_BUFFER_SIZE, DEFAULT_DIAL_TIMEOUT, StreamConfig};
pub use crate::error::StreamError;
pub use crate::transport::{Connection, Protocol, Transport};
