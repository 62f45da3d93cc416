use crate::Socket;
use anyhow::Context;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::headers::{HeaderIter, HttpHeader};
use super::method::Method;
use super::skip_line;
use super::status_line::Status;

const MAX_HEAD_SIZE: usize = 8 * 1024;

/// One HTTP/1.0 exchange over a socket: request line, headers, empty body,
/// then the response head and a close-delimited or length-delimited body.
#[derive(Debug)]
pub struct HttpContext<S: Socket = TcpStream> {
    socket: S,
    pub response_meta: Vec<u8>,
    pub response_first_chunk: Vec<u8>,
}

impl HttpContext {
    pub async fn connect(host: &str, port: u16) -> anyhow::Result<Self> {
        let socket = TcpStream::connect((host, port))
            .await
            .with_context(|| format!("establish connection to {host}:{port}"))?;
        Ok(Self::with_socket(socket))
    }

    pub fn peer(&self) -> anyhow::Result<String> {
        Ok(self.socket.peer_addr().context("peer address")?.to_string())
    }
}

impl<S: Socket> HttpContext<S> {
    pub fn with_socket(socket: S) -> Self {
        Self {
            socket,
            response_meta: vec![],
            response_first_chunk: vec![],
        }
    }

    pub async fn begin_request(
        &mut self,
        method: Method,
        resource: impl AsRef<str>,
    ) -> anyhow::Result<()> {
        let msg = format!("{} {} HTTP/1.0\r\n", method, resource.as_ref());
        self.write_str(&msg).await.context("send start line")
    }

    pub async fn request_header(&mut self, header: HttpHeader) -> anyhow::Result<()> {
        tracing::trace!(%header, "request header");
        let msg = format!("{}\r\n", header);
        self.write_str(&msg).await.context("request header")
    }

    pub async fn request_headers_end(&mut self) -> anyhow::Result<()> {
        self.write_str("\r\n")
            .await
            .context("end of request headers")
    }

    pub async fn request_body_chunk(&mut self, chunk: impl AsRef<[u8]>) -> anyhow::Result<()> {
        self.socket
            .write_all(chunk.as_ref())
            .await
            .context("send request body chunk")
    }

    pub async fn end_request(&mut self) -> anyhow::Result<()> {
        self.socket.flush().await.context("flush request")
    }
}

impl<S: Socket> HttpContext<S> {
    /// Reads until the blank line that ends the response head. Bytes past it
    /// are kept as the beginning of the body.
    pub async fn response_begin(&mut self) -> anyhow::Result<()> {
        let mut buf = [0; MAX_HEAD_SIZE];
        let mut head = Vec::new();
        self.response_meta.clear();
        self.response_first_chunk.clear();
        loop {
            let n = self
                .socket
                .read(&mut buf)
                .await
                .context("read response begin")?;
            if n == 0 {
                anyhow::bail!(
                    "connection closed after {} bytes, before the end of the response head",
                    head.len()
                );
            }
            // the delimiter may straddle two reads
            let search_from = head.len().saturating_sub(3);
            head.extend_from_slice(&buf[..n]);
            if let Some(payload_index) = head[search_from..]
                .windows(4)
                .position(|w| w.eq(b"\r\n\r\n"))
                .map(|i| i + search_from)
            {
                self.response_first_chunk
                    .extend_from_slice(&head[payload_index + 4..]);
                head.truncate(payload_index);
                self.response_meta = head;
                return Ok(());
            }
            if head.len() > MAX_HEAD_SIZE {
                anyhow::bail!("response head exceeds {MAX_HEAD_SIZE} bytes");
            }
        }
    }

    pub fn status(&self) -> anyhow::Result<Status<'_>> {
        Status::new(&self.response_meta)
    }

    pub fn response_header_iter(&self) -> HeaderIter<'_> {
        HeaderIter::new(skip_line(&self.response_meta))
    }

    pub fn content_length(&self) -> Option<usize> {
        self.response_header_iter().find_map(|header| match header {
            HttpHeader::ContentLength(size) => Some(size),
            _ => None,
        })
    }

    pub fn date(&self) -> Option<httpdate::HttpDate> {
        self.response_header_iter().find_map(|header| match header {
            HttpHeader::Date(date) => Some(date),
            _ => None,
        })
    }

    /// Without `Content-Length` the body runs until the server closes.
    pub async fn response_body(&mut self) -> anyhow::Result<Vec<u8>> {
        let mut body = std::mem::take(&mut self.response_first_chunk);
        match self.content_length() {
            Some(length) if body.len() >= length => body.truncate(length),
            Some(length) => {
                let missing = (length - body.len()) as u64;
                (&mut self.socket)
                    .take(missing)
                    .read_to_end(&mut body)
                    .await
                    .context("read response body")?;
                if body.len() < length {
                    anyhow::bail!(
                        "response body truncated: got {} of {} bytes",
                        body.len(),
                        length
                    );
                }
            }
            None => {
                self.socket
                    .read_to_end(&mut body)
                    .await
                    .context("read response body until close")?;
            }
        }
        Ok(body)
    }
}

impl<S: Socket> HttpContext<S> {
    async fn write_str(&mut self, data: &str) -> anyhow::Result<()> {
        self.socket
            .write_all(data.as_bytes())
            .await
            .context("write str to socket")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tokio::io::{duplex, AsyncBufReadExt, BufReader, DuplexStream};

    async fn read_request(server: &mut BufReader<DuplexStream>) -> Vec<String> {
        let mut lines = vec![];
        loop {
            let mut line = String::new();
            server.read_line(&mut line).await.unwrap();
            let line = line.trim_end().to_owned();
            if line.is_empty() {
                return lines;
            }
            lines.push(line);
        }
    }

    #[tokio::test]
    async fn writes_get_request() {
        let (client, server) = duplex(4096);
        let mut http = HttpContext::with_socket(client);
        http.begin_request(Method::Get, "/v1.0/ping").await.unwrap();
        http.request_header(HttpHeader::json()).await.unwrap();
        http.request_headers_end().await.unwrap();
        http.end_request().await.unwrap();

        let mut server = BufReader::new(server);
        assert_eq!(
            read_request(&mut server).await,
            vec!["GET /v1.0/ping HTTP/1.0", "Content-Type: application/json"]
        );
    }

    #[tokio::test]
    async fn reads_length_delimited_body_split_across_writes() {
        let (client, mut server) = duplex(4096);
        let mut http = HttpContext::with_socket(client);
        let answer = tokio::spawn(async move {
            server.write_all(b"HTTP/1.0 200 OK\r\nContent-Le").await.unwrap();
            server.write_all(b"ngth: 5\r\n\r").await.unwrap();
            server.write_all(b"\nhel").await.unwrap();
            server.write_all(b"lo and trailing junk").await.unwrap();
            server
        });
        http.response_begin().await.unwrap();
        assert_eq!(http.status().unwrap().code(), 200);
        assert_eq!(http.content_length(), Some(5));
        assert_eq!(http.response_body().await.unwrap(), b"hello");
        drop(answer.await.unwrap());
    }

    #[tokio::test]
    async fn reads_close_delimited_body() {
        let (client, mut server) = duplex(4096);
        let mut http = HttpContext::with_socket(client);
        server
            .write_all(b"HTTP/1.0 200 OK\r\nDate: Fri, 24 Nov 2023 06:58:19 GMT\r\n\r\nall ok")
            .await
            .unwrap();
        drop(server);
        http.response_begin().await.unwrap();
        assert!(http.date().is_some());
        assert_eq!(http.content_length(), None);
        assert_eq!(http.response_body().await.unwrap(), b"all ok");
    }

    #[tokio::test]
    async fn early_close_is_an_error() {
        let (client, mut server) = duplex(4096);
        let mut http = HttpContext::with_socket(client);
        server.write_all(b"HTTP/1.0 200 OK\r\n").await.unwrap();
        drop(server);
        assert!(http.response_begin().await.is_err());
    }

    #[tokio::test]
    async fn short_body_is_an_error() {
        let (client, mut server) = duplex(4096);
        let mut http = HttpContext::with_socket(client);
        server
            .write_all(b"HTTP/1.0 200 OK\r\nContent-Length: 10\r\n\r\nshort")
            .await
            .unwrap();
        drop(server);
        http.response_begin().await.unwrap();
        assert!(http.response_body().await.is_err());
    }

    #[tokio::test]
    async fn bad_date_keeps_content_length() {
        let (client, mut server) = duplex(4096);
        let mut http = HttpContext::with_socket(client);
        server
            .write_all(b"HTTP/1.0 200 OK\r\nDate: yesterday\r\nContent-Length: 2\r\n\r\nOKjunk")
            .await
            .unwrap();
        http.response_begin().await.unwrap();
        assert_eq!(http.date(), None);
        assert_eq!(http.content_length(), Some(2));
        // server stays open: the body must end at Content-Length, not at close
        assert_eq!(http.response_body().await.unwrap(), b"OK");
        drop(server);
    }
}
