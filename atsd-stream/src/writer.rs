use std::io::{self, BufWriter, Write};

use atsd_core::LINE_TERMINATOR;

/// Буфер строк поверх открытого соединения.
///
/// Каждая строка вместе с терминатором попадает в `BufWriter` одной записью:
/// если она не помещается, сначала в сокет уходит всё накопленное (целые
/// строки), а строка длиннее ёмкости пишется в сокет напрямую. Так одна
/// запись в сокет никогда не обрывает строку посередине.
#[derive(Debug)]
pub struct ChannelWriter<T: Write> {
    inner: BufWriter<T>,
}

impl<T: Write> ChannelWriter<T> {
    pub fn with_capacity(capacity: usize, transport: T) -> Self {
        Self {
            inner: BufWriter::with_capacity(capacity, transport),
        }
    }

    /// Добавить строку (без терминатора). Может заблокироваться на записи в сокет.
    pub fn append(&mut self, line: &str) -> io::Result<()> {
        let mut framed = String::with_capacity(line.len() + 1);
        framed.push_str(line);
        framed.push(LINE_TERMINATOR);
        self.inner.write_all(framed.as_bytes())
    }

    /// Отдать всё накопленное в сокет. После `Ok` буфер пуст.
    ///
    /// При ошибке незаписанные байты остаются в буфере.
    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    /// Сколько байт ждёт отправки
    pub fn buffered(&self) -> usize {
        self.inner.buffer().len()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    pub fn get_ref(&self) -> &T {
        self.inner.get_ref()
    }

    /// Забрать транспорт без сброса буфера.
    ///
    /// Возвращает транспорт и число выброшенных байт.
    pub fn into_transport(self) -> (T, usize) {
        let (transport, pending) = self.inner.into_parts();
        let dropped = match pending {
            Ok(buf) => buf.len(),
            Err(panicked) => panicked.into_inner().len(),
        };
        (transport, dropped)
    }
}
