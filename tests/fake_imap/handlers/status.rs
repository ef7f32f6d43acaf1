//! STATUS command handler.
//!
//! Always answers with the `MESSAGES` attribute, whatever was asked.
//! With `split` set, the count is spread over two untagged STATUS
//! responses, which clients must add up.

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::Mailbox;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

pub async fn handle_status<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    folder_name: &str,
    split: bool,
    mailbox: &Mailbox,
    stream: &mut BufReader<S>,
) {
    let Some(folder) = mailbox.get_folder(folder_name) else {
        let resp = format!("{tag} NO [NONEXISTENT] Folder not found\r\n");
        let _ = write_line(stream, &resp).await;
        return;
    };

    let total = folder.emails.len();
    let counts = if split {
        vec![total / 2, total - total / 2]
    } else {
        vec![total]
    };

    for count in counts {
        let line = format!("* STATUS \"{folder_name}\" (MESSAGES {count})\r\n");
        if write_line(stream, &line).await.is_err() {
            return;
        }
    }

    let resp = format!("{tag} OK STATUS completed\r\n");
    let _ = write_line(stream, &resp).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use tokio::io::BufReader;

    async fn run(folder_name: &str, split: bool, mailbox: &Mailbox) -> String {
        let (client, server) = tokio::io::duplex(4096);
        let mut stream = BufReader::new(server);

        handle_status("A2", folder_name, split, mailbox, &mut stream).await;
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn three_messages() -> Mailbox {
        MailboxBuilder::new()
            .folder("INBOX")
            .email(1, b"")
            .email(2, b"")
            .email(3, b"")
            .build()
    }

    #[tokio::test]
    async fn reports_message_count() {
        let output = run("INBOX", false, &three_messages()).await;
        assert_eq!(
            output,
            "* STATUS \"INBOX\" (MESSAGES 3)\r\nA2 OK STATUS completed\r\n"
        );
    }

    #[tokio::test]
    async fn split_count_adds_up() {
        let output = run("INBOX", true, &three_messages()).await;
        assert!(output.contains("(MESSAGES 1)"));
        assert!(output.contains("(MESSAGES 2)"));
    }

    #[tokio::test]
    async fn missing_folder_is_no() {
        let output = run("Nope", false, &three_messages()).await;
        assert!(output.starts_with("A2 NO"));
    }
}
