//! Line-delimited request/response framing.
//!
//! A request is one line holding the URL. A response is the page split into
//! newline-terminated lines, closed by a line holding only [`SENTINEL`].
//! The sentinel is not escaped: a page containing that exact line cuts the
//! response short on the receiving side. Existing peers depend on this
//! format, so it stays as is.

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

/// Line that terminates every response frame.
pub const SENTINEL: &str = "<END_OF_HTML>";

/// Iterator over the lines of a text, accepting `\n`, `\r\n` and `\r` as
/// terminators. A trailing terminator does not start an extra empty line.
#[derive(Debug, Clone)]
pub struct Lines<'a> {
    rest: &'a str,
}

pub fn split_lines(text: &str) -> Lines<'_> {
    Lines { rest: text }
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }

        match self.rest.find(['\r', '\n']) {
            Some(pos) => {
                let line = &self.rest[..pos];
                let skip = if self.rest[pos..].starts_with("\r\n") { 2 } else { 1 };
                self.rest = &self.rest[pos + skip..];
                Some(line)
            }
            None => {
                let line = self.rest;
                self.rest = "";
                Some(line)
            }
        }
    }
}

/// Rebuilds `text` with exactly one `\n` after every line.
pub fn normalize_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 1);
    for line in split_lines(text) {
        out.push_str(line);
        out.push('\n');
    }
    out
}

pub fn encode_request(url: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(url.len() + 1);
    buf.put_slice(url.as_bytes());
    buf.put_u8(b'\n');
    buf.freeze()
}

pub fn encode_response(body: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(body.len() + SENTINEL.len() + 2);
    for line in split_lines(body) {
        buf.put_slice(line.as_bytes());
        buf.put_u8(b'\n');
    }
    buf.put_slice(SENTINEL.as_bytes());
    buf.put_u8(b'\n');
    buf.freeze()
}

/// Reads one line into `buf` and decodes it, replacing invalid UTF-8.
/// The terminator (`\n` or `\r\n`) is stripped. `None` means end of stream.
async fn read_line_lossy<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    if buf.ends_with(b"\n") {
        buf.pop();
        if buf.ends_with(b"\r") {
            buf.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// Reads one request line.
///
/// Returns `Ok(None)` when the peer closed the stream before sending
/// anything. A last line without a terminator is still a request, and bytes
/// that are not valid UTF-8 are replaced rather than rejected.
pub async fn read_request<R>(reader: &mut R) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    read_line_lossy(reader, &mut Vec::new()).await
}

/// Reads lines up to the sentinel and returns everything before it, one
/// `\n` per line. The sentinel itself is dropped.
///
/// End of stream before the sentinel is an `UnexpectedEof` error; the
/// partial page is discarded.
pub async fn read_response<R>(reader: &mut R) -> io::Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut body = String::new();
    let mut buf = Vec::new();

    loop {
        let Some(line) = read_line_lossy(reader, &mut buf).await? else {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stream ended before end-of-response marker",
            ));
        };

        if line == SENTINEL {
            return Ok(body);
        }

        body.push_str(&line);
        body.push('\n');
    }
}

pub async fn write_request<W>(writer: &mut W, url: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode_request(url)).await?;
    writer.flush().await
}

pub async fn write_response<W>(writer: &mut W, body: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode_response(body)).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_lines_accepts_all_terminators() {
        let lines: Vec<_> = split_lines("a\nb\r\nc\rd").collect();
        assert_eq!(lines, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn split_lines_keeps_blank_lines() {
        let lines: Vec<_> = split_lines("a\n\nb\n").collect();
        assert_eq!(lines, vec!["a", "", "b"]);
    }

    #[test]
    fn encode_response_terminates_unterminated_body() {
        let frame = encode_response("<html>ok</html>");
        assert_eq!(&frame[..], b"<html>ok</html>\n<END_OF_HTML>\n");
    }

    #[tokio::test]
    async fn read_request_strips_crlf() {
        let mut input: &[u8] = b"https://example.com\r\n";
        let url = read_request(&mut input).await.unwrap();
        assert_eq!(url.as_deref(), Some("https://example.com"));
    }

    #[tokio::test]
    async fn read_request_replaces_invalid_utf8() {
        let mut input: &[u8] = b"http://example.com/caf\xe9\n";
        let url = read_request(&mut input).await.unwrap();
        assert_eq!(url.as_deref(), Some("http://example.com/caf\u{FFFD}"));
    }

    #[tokio::test]
    async fn read_response_stops_at_sentinel() {
        let mut input: &[u8] = b"one\ntwo\n<END_OF_HTML>\nleftover\n";
        let body = read_response(&mut input).await.unwrap();
        assert_eq!(body, "one\ntwo\n");
        assert_eq!(input, b"leftover\n");
    }
}
