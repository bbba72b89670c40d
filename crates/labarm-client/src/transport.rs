//! 传输会话
//!
//! [`LineTransport`] 是客户端唯一依赖的接口：写一行、带超时读一行、关闭。
//! [`TcpTransport`] 是基于 tokio `TcpStream` 的实现。

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{debug, trace};

/// 单行应答的最大字节数（不含换行符）
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// 传输层错误
#[derive(Error, Debug)]
pub enum TransportError {
    /// 在超时时间内没有收到完整的一行
    #[error("Read timeout")]
    Timeout,

    /// 对端关闭或连接被重置
    #[error("Connection closed")]
    Disconnected,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl TransportError {
    /// 把连接类 IO 错误归一化为 `Disconnected`
    pub fn from_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::UnexpectedEof
            | io::ErrorKind::NotConnected => TransportError::Disconnected,
            io::ErrorKind::TimedOut => TransportError::Timeout,
            _ => TransportError::Io(err),
        }
    }
}

/// 行传输接口
///
/// 实现方必须保证：`read_line` 超时后，已读到的半行数据保留到下一次调用。
/// 返回的行不含行结束符。
pub trait LineTransport: Send {
    /// 写一行（实现方负责追加行结束符）
    fn write_line(&mut self, line: &str) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// 读一行，超时返回 `TransportError::Timeout`
    fn read_line(
        &mut self,
        timeout: Duration,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;

    /// 关闭连接
    fn close(&mut self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// TCP 行传输
pub struct TcpTransport {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    peer: SocketAddr,
    /// 尚未遇到换行符的半行数据
    pending: Vec<u8>,
}

impl TcpTransport {
    /// 连接控制器
    pub async fn connect(
        host: &str,
        port: u16,
        connect_timeout: Duration,
    ) -> Result<Self, TransportError> {
        debug!("Connecting to {}:{}", host, port);
        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| TransportError::Timeout)?
            .map_err(TransportError::Io)?;
        Self::from_stream(stream)
    }

    /// 包装一个已建立的连接
    pub fn from_stream(stream: TcpStream) -> Result<Self, TransportError> {
        // 一问一答协议，关闭 Nagle 避免请求行被延迟
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            peer,
            pending: Vec::new(),
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// 取出缓冲中的完整一行；非 UTF-8 内容作为 `InvalidData` 返回，不做替换
    fn take_line(&mut self) -> Result<String, TransportError> {
        let bytes = std::mem::take(&mut self.pending);
        let line = String::from_utf8(bytes).map_err(|e| {
            TransportError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("reply line is not valid UTF-8: {e}"),
            ))
        })?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl LineTransport for TcpTransport {
    async fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        trace!("{} >> {}", self.peer, line);
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        self.writer
            .write_all(&buf)
            .await
            .map_err(TransportError::from_io)?;
        self.writer.flush().await.map_err(TransportError::from_io)
    }

    async fn read_line(&mut self, timeout: Duration) -> Result<String, TransportError> {
        // read_until 在被取消时会把已读字节留在 pending 中
        let limit = (MAX_LINE_LEN + 1).saturating_sub(self.pending.len()) as u64;
        let mut limited = (&mut self.reader).take(limit);
        tokio::time::timeout(timeout, limited.read_until(b'\n', &mut self.pending))
            .await
            .map_err(|_| TransportError::Timeout)?
            .map_err(TransportError::from_io)?;

        if self.pending.last() != Some(&b'\n') {
            if self.pending.len() > MAX_LINE_LEN {
                self.pending.clear();
                return Err(TransportError::Io(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("reply line exceeds {MAX_LINE_LEN} bytes"),
                )));
            }
            // EOF：没有完整的行
            return Err(TransportError::Disconnected);
        }
        let line = self.take_line()?;
        trace!("{} << {}", self.peer, line);
        Ok(line)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        debug!("Closing connection to {}", self.peer);
        match self.writer.shutdown().await {
            Ok(()) => Ok(()),
            Err(e) => match TransportError::from_io(e) {
                TransportError::Disconnected => Ok(()),
                other => Err(other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn pair() -> (TcpTransport, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (client, server) = tokio::join!(
            TcpTransport::connect("127.0.0.1", addr.port(), Duration::from_secs(1)),
            listener.accept()
        );
        (client.unwrap(), server.unwrap().0)
    }

    #[test]
    fn test_from_io_maps_connection_errors() {
        let err = TransportError::from_io(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(matches!(err, TransportError::Disconnected));
        let err = TransportError::from_io(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, TransportError::Io(_)));
    }

    #[tokio::test]
    async fn test_write_and_read_lines() {
        let (mut client, mut server) = pair().await;

        client.write_line("wherec").await.unwrap();
        let mut buf = [0u8; 7];
        tokio::io::AsyncReadExt::read_exact(&mut server, &mut buf)
            .await
            .unwrap();
        assert_eq!(&buf, b"wherec\n");

        server.write_all(b"0 1 2 3 4 5 6\r\n").await.unwrap();
        let line = client.read_line(Duration::from_secs(1)).await.unwrap();
        assert_eq!(line, "0 1 2 3 4 5 6");
    }

    #[tokio::test]
    async fn test_partial_line_survives_timeout() {
        let (mut client, mut server) = pair().await;

        server.write_all(b"0 -").await.unwrap();
        let err = client
            .read_line(Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Timeout));

        server.write_all(b"1\n").await.unwrap();
        let line = client.read_line(Duration::from_secs(1)).await.unwrap();
        assert_eq!(line, "0 -1");
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_rejected_not_replaced() {
        let (mut client, mut server) = pair().await;

        server.write_all(b"0 \xff\xfe\n0\n").await.unwrap();
        let err = client.read_line(Duration::from_secs(1)).await.unwrap_err();
        match err {
            TransportError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::InvalidData),
            other => panic!("Expected InvalidData, got {:?}", other),
        }

        // 坏行被整行丢弃，下一行正常读取
        let line = client.read_line(Duration::from_secs(1)).await.unwrap();
        assert_eq!(line, "0");
    }

    #[tokio::test]
    async fn test_overlong_line_is_rejected() {
        let (mut client, mut server) = pair().await;

        let junk = vec![b'9'; MAX_LINE_LEN + 10];
        let writer = tokio::spawn(async move {
            server.write_all(&junk).await.unwrap();
            server
        });
        let err = client.read_line(Duration::from_secs(1)).await.unwrap_err();
        match err {
            TransportError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::InvalidData),
            other => panic!("Expected InvalidData, got {:?}", other),
        }
        assert!(client.pending.is_empty());
        drop(writer.await.unwrap());
    }

    #[tokio::test]
    async fn test_line_at_length_limit_is_accepted() {
        let (mut client, mut server) = pair().await;

        let mut line = vec![b'0'; MAX_LINE_LEN];
        line.push(b'\n');
        let writer = tokio::spawn(async move {
            server.write_all(&line).await.unwrap();
            server
        });
        let read = client.read_line(Duration::from_secs(1)).await.unwrap();
        assert_eq!(read.len(), MAX_LINE_LEN);
        drop(writer.await.unwrap());
    }

    #[tokio::test]
    async fn test_eof_is_disconnected() {
        let (mut client, server) = pair().await;
        drop(server);
        let err = client.read_line(Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, TransportError::Disconnected));
    }
}
