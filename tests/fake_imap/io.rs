//! Shared write helpers for the fake IMAP server.
//!
//! Every helper flushes, so a client blocked on a response never waits
//! for a buffer to fill.

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Write a string to the stream and flush.
pub async fn write_line<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut BufReader<S>,
    line: &str,
) -> std::io::Result<()> {
    stream.get_mut().write_all(line.as_bytes()).await?;
    stream.get_mut().flush().await
}

/// Write an IMAP counted literal: `{len}\r\n` followed by the bytes.
pub async fn write_literal<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut BufReader<S>,
    data: &[u8],
) -> std::io::Result<()> {
    let writer = stream.get_mut();
    writer
        .write_all(format!("{{{}}}\r\n", data.len()).as_bytes())
        .await?;
    writer.write_all(data).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn literal_is_prefixed_with_its_length() {
        let (client, server) = tokio::io::duplex(256);
        let mut stream = BufReader::new(server);

        write_literal(&mut stream, b"hello\r\n").await.unwrap();
        drop(stream);

        let mut buf = Vec::new();
        BufReader::new(client).read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"{7}\r\nhello\r\n");
    }
}
