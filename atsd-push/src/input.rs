use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use atsd_core::{AtsdCoreError, Command};
use thiserror::Error;

use crate::cli::is_stdin;

#[derive(Debug, Error)]
pub(crate) enum InputError {
    #[error("failed to open input: {path:?}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read {origin} at line {line_no}")]
    Read {
        origin: String,
        line_no: usize,
        #[source]
        source: io::Error,
    },

    #[error("{origin}:{line_no}: bad command")]
    Parse {
        origin: String,
        line_no: usize,
        #[source]
        source: AtsdCoreError,
    },
}

pub(crate) type Result<T> = std::result::Result<T, InputError>;

/// Команды из построчного источника.
///
/// Читает лениво, по строке за раз: stdin может быть бесконечным.
pub(crate) struct CommandLines<R> {
    lines: io::Lines<R>,
    origin: String,
    line_no: usize,
}

impl<R: BufRead> CommandLines<R> {
    pub(crate) fn new(reader: R, origin: impl Into<String>) -> Self {
        Self {
            lines: reader.lines(),
            origin: origin.into(),
            line_no: 0,
        }
    }
}

impl<R: BufRead> Iterator for CommandLines<R> {
    type Item = Result<Command>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;

            let line = match line {
                Ok(l) => l,
                Err(source) => {
                    return Some(Err(InputError::Read {
                        origin: self.origin.clone(),
                        line_no: self.line_no,
                        source,
                    }));
                }
            };

            let Some(text) = normalize_line(&line) else {
                continue;
            };

            return Some(text.parse::<Command>().map_err(|source| InputError::Parse {
                origin: self.origin.clone(),
                line_no: self.line_no,
                source,
            }));
        }
    }
}

/// Открывает `--input`: файл или stdin для "-"
pub(crate) fn open_input(path: &Path) -> Result<CommandLines<Box<dyn BufRead>>> {
    if is_stdin(path) {
        let reader: Box<dyn BufRead> = Box::new(BufReader::new(io::stdin()));
        return Ok(CommandLines::new(reader, "stdin"));
    }

    let file = File::open(path).map_err(|source| InputError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let reader: Box<dyn BufRead> = Box::new(BufReader::new(file));
    Ok(CommandLines::new(reader, path.display().to_string()))
}

// пустые строки и строки-комментарии пропускаем; inline-комментариев нет,
// '#' может встретиться в значении тега
fn normalize_line(line: &str) -> Option<&str> {
    let s = line.trim();
    if s.is_empty() || s.starts_with('#') {
        return None;
    }
    Some(s)
}
