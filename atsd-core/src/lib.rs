//! # atsd-core
//!
//! Базовые типы и текстовый протокол потоковых команд ATSD.
//!
//! Этот крейт содержит:
//!
//! - [`command`] — команды `series`, `property`, `entity-tag` и их валидация
//! - [`protocol`] — кодирование команды в строку и разбор строки обратно
//! - [`error`] — типы ошибок, которые возвращают компоненты `atsd-core`
//!
//! ## Быстрый пример: кодирование `series`
//!
//! ```rust
//! use atsd_core::{Command, SeriesCommand};
//! use atsd_core::protocol::encode_line;
//!
//! let cmd: Command = SeriesCommand::new("e1", "m1", 1.5).into();
//! assert_eq!(encode_line(&cmd), "series e:e1 m:m1=1.5\n");
//! ```
//!
//! ## Пример: разбор строки
//!
//! ```rust
//! use atsd_core::Command;
//!
//! let cmd: Command = "entity-tag e:host-1 t:os=linux".parse().unwrap();
//! assert_eq!(cmd.name(), "entity-tag");
//! assert_eq!(cmd.entity(), "host-1");
//! ```
//!
//! ## Формат строки
//!
//! ```text
//! series e:<entity> [ms:<millis>] (t:<tag>=<value>)* (m:<metric>=<value>)+
//! property e:<entity> t:<type> [ms:<millis>] (k:<key>=<value>)* (v:<tag>=<value>)*
//! entity-tag e:<entity> (t:<tag>=<value>)+
//! ```
//!
//! Пробелы и `=` внутри имён и значений не экранируются, как и в самом сервере.
//! Переводы строки отсекает [`Command::validate`].
//!
//! ## Дизайн
//!
//! `atsd-core` — “нулевая” зависимость для клиента и утилит: только чистые
//! типы и сериализация, без сети и без runtime.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Команды потокового протокола.
pub mod command;

/// Текстовый протокол: кодирование и разбор строк.
pub mod protocol;

/// Ошибки `atsd-core`.
pub mod error;

/// Общие константы
mod constants;
pub use constants::{DEFAULT_NETWORK_PORT, ENTITY_TAG, LINE_TERMINATOR, PROPERTY, SERIES};

// --- Re-exports (публичный фасад API) ---

pub use crate::command::{Command, EntityTagCommand, PropertyCommand, SeriesCommand};
pub use crate::error::{AtsdCoreError, CommandError, ProtocolError};
pub use crate::protocol::{encode_line, parse_command};
