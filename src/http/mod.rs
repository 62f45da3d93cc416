mod context;
pub mod headers;
mod method;
pub mod status_line;

pub use context::HttpContext;
pub use headers::HttpHeader;
pub use method::Method;
pub use status_line::Status;

fn end_of_line(line: &[u8]) -> usize {
    line.windows(2)
        .enumerate()
        .find(|(_, w)| w.eq(b"\r\n"))
        .map(|(i, _)| i)
        .unwrap_or(line.len())
}

fn get_line(line: &[u8]) -> &[u8] {
    let end_of_line = end_of_line(line);
    &line[..end_of_line]
}

fn skip_line(line: &[u8]) -> &[u8] {
    let end_of_line = end_of_line(line);
    if end_of_line == line.len() {
        &line[end_of_line..end_of_line]
    } else {
        &line[(end_of_line + 2)..]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn lines_are_split_on_crlf() {
        let meta = b"HTTP/1.0 200 OK\r\nContent-Length: 2";
        assert_eq!(get_line(meta), b"HTTP/1.0 200 OK");
        assert_eq!(skip_line(meta), b"Content-Length: 2");
        assert!(skip_line(skip_line(meta)).is_empty());
    }
}
