use std::fmt;
use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::str::FromStr;
use std::time::Duration;

use log::debug;

use crate::error::StreamError;

/// Сетевой транспорт, выбирается по имени при создании клиента
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Tcp,
    Tcp4,
    Tcp6,
    Udp,
    Udp4,
    Udp6,
    #[cfg(unix)]
    Unix,
}

impl Protocol {
    fn name(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Tcp4 => "tcp4",
            Protocol::Tcp6 => "tcp6",
            Protocol::Udp => "udp",
            Protocol::Udp4 => "udp4",
            Protocol::Udp6 => "udp6",
            #[cfg(unix)]
            Protocol::Unix => "unix",
        }
    }

    /// Адрес — путь к локальному сокету, а не host:port
    pub fn is_unix(self) -> bool {
        #[cfg(unix)]
        {
            matches!(self, Protocol::Unix)
        }
        #[cfg(not(unix))]
        {
            false
        }
    }

    // фильтр по семейству адресов для tcp4/tcp6/udp4/udp6
    fn accepts(self, addr: &SocketAddr) -> bool {
        match self {
            Protocol::Tcp4 | Protocol::Udp4 => addr.is_ipv4(),
            Protocol::Tcp6 | Protocol::Udp6 => addr.is_ipv6(),
            _ => true,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Protocol {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "tcp4" => Ok(Protocol::Tcp4),
            "tcp6" => Ok(Protocol::Tcp6),
            "udp" => Ok(Protocol::Udp),
            "udp4" => Ok(Protocol::Udp4),
            "udp6" => Ok(Protocol::Udp6),
            #[cfg(unix)]
            "unix" => Ok(Protocol::Unix),
            _ => Err(StreamError::UnsupportedProtocol(s.to_string())),
        }
    }
}

/// Байтовый поток, в который клиент сбрасывает буфер.
///
/// Помимо записи умеет закрываться; этого достаточно, чтобы подменить сокет
/// в тестах.
pub trait Transport: Write + Send {
    /// Закрыть соединение. Вызывается один раз, из `close`.
    fn shutdown(&mut self) -> io::Result<()>;
}

/// Открытое соединение, полученное через [`dial`].
#[derive(Debug)]
pub enum Connection {
    Tcp(TcpStream),
    /// Подключённый UDP-сокет: каждая запись уходит отдельной датаграммой
    Udp(UdpSocket),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl Connection {
    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        match self {
            Connection::Tcp(s) => s.set_write_timeout(timeout),
            Connection::Udp(s) => s.set_write_timeout(timeout),
            #[cfg(unix)]
            Connection::Unix(s) => s.set_write_timeout(timeout),
        }
    }
}

impl Write for Connection {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Connection::Tcp(s) => s.write(buf),
            Connection::Udp(s) => s.send(buf),
            #[cfg(unix)]
            Connection::Unix(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Connection::Tcp(s) => s.flush(),
            Connection::Udp(_) => Ok(()),
            #[cfg(unix)]
            Connection::Unix(s) => s.flush(),
        }
    }
}

impl Transport for Connection {
    fn shutdown(&mut self) -> io::Result<()> {
        match self {
            Connection::Tcp(s) => s.shutdown(Shutdown::Both),
            // у UDP нечего закрывать, сокет освободится при drop
            Connection::Udp(_) => Ok(()),
            #[cfg(unix)]
            Connection::Unix(s) => s.shutdown(Shutdown::Both),
        }
    }
}

/// Открывает соединение `protocol` к `address` с ограничением по времени.
///
/// Для tcp перебираем все адреса из резолвинга, первый успешный выигрывает.
/// Нулевой `timeout` означает обычный блокирующий connect.
pub fn dial(protocol: Protocol, address: &str, timeout: Duration) -> Result<Connection, StreamError> {
    let conn = match protocol {
        Protocol::Tcp | Protocol::Tcp4 | Protocol::Tcp6 => {
            dial_tcp(protocol, address, timeout).map(Connection::Tcp)
        }
        Protocol::Udp | Protocol::Udp4 | Protocol::Udp6 => {
            dial_udp(protocol, address).map(Connection::Udp)
        }
        #[cfg(unix)]
        Protocol::Unix => UnixStream::connect(address).map(Connection::Unix),
    };

    conn.map_err(|source| StreamError::Dial {
        address: format!("{protocol}://{address}"),
        source,
    })
}

fn resolve(protocol: Protocol, address: &str) -> io::Result<Vec<SocketAddr>> {
    let addrs: Vec<SocketAddr> = address
        .to_socket_addrs()?
        .filter(|a| protocol.accepts(a))
        .collect();

    if addrs.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no {protocol} addresses resolved for {address}"),
        ));
    }
    Ok(addrs)
}

fn dial_tcp(protocol: Protocol, address: &str, timeout: Duration) -> io::Result<TcpStream> {
    let mut last_err = None;

    for addr in resolve(protocol, address)? {
        let res = if timeout.is_zero() {
            TcpStream::connect(addr)
        } else {
            TcpStream::connect_timeout(&addr, timeout)
        };

        match res {
            Ok(stream) => {
                // строки короткие, Nagle только добавит задержку
                stream.set_nodelay(true).ok();
                debug!("connected to {addr} over {protocol}");
                return Ok(stream);
            }
            Err(e) => {
                debug!("connect to {addr} failed: {e}");
                last_err = Some(e);
            }
        }
    }

    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no addresses to dial")))
}

fn dial_udp(protocol: Protocol, address: &str) -> io::Result<UdpSocket> {
    let addrs = resolve(protocol, address)?;
    let target = addrs[0];

    let local: SocketAddr = if target.is_ipv4() {
        ([0, 0, 0, 0], 0).into()
    } else {
        (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
    };

    let sock = UdpSocket::bind(local)?;
    sock.connect(target)?;
    debug!("udp socket {} connected to {target}", sock.local_addr()?);
    Ok(sock)
}
