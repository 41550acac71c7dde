//! Reading typed commands and driving the interactive session

use crate::network::{Client, ClientError};
use log::info;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt};

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputLine {
    /// Blank or whitespace only, ignored
    Empty,
    /// `quit` or `exit`
    Quit,
    Command(Vec<String>),
}

impl InputLine {
    pub fn parse(line: &str) -> Self {
        let fields = shared::split_fields(line);
        match fields.first().map(String::as_str) {
            None => InputLine::Empty,
            Some(word) if fields.len() == 1 && matches!(word, "quit" | "exit") => InputLine::Quit,
            Some(_) => InputLine::Command(fields),
        }
    }
}

/// Reads the next line. `None` at end of input.
pub async fn next_line<R>(reader: &mut R) -> io::Result<Option<InputLine>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    Ok(Some(InputLine::parse(&line)))
}

/// Prompts for commands on `input` and prints replies to `output` until the
/// user quits, input ends, or the session becomes unusable.
///
/// Refused commands are printed as `Error: <message>` and the loop carries on;
/// a fatal error (connection lost, player unknown to the server) is printed
/// and then returned.
pub async fn accept_commands<T, R, W>(
    client: &mut Client<T>,
    input: &mut R,
    output: &mut W,
) -> Result<(), ClientError>
where
    T: AsyncRead + AsyncWrite + Unpin,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        output.write_all(b"> ").await?;
        output.flush().await?;

        let fields = match next_line(input).await? {
            None => {
                info!("End of input");
                return Ok(());
            }
            Some(InputLine::Quit) => return Ok(()),
            Some(InputLine::Empty) => continue,
            Some(InputLine::Command(fields)) => fields,
        };

        match client.send_command(fields).await {
            Ok(text) => {
                output.write_all(text.as_bytes()).await?;
                if !text.ends_with('\n') {
                    output.write_all(b"\n").await?;
                }
            }
            Err(e) => {
                output
                    .write_all(format!("Error: {}\n", e).as_bytes())
                    .await?;
                if e.is_fatal() {
                    output.flush().await?;
                    return Err(e);
                }
            }
        }
    }
}
