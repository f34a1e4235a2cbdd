//! CLI gateway: line-delimited JSON events on stdin, for local testing.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::LinesStream;
use tracing::{error, warn};

use crate::error::GatewayError;
use crate::events::GatewayEvent;

use super::{EventStream, Gateway};

type Input = Box<dyn AsyncBufRead + Unpin + Send>;

/// Reads one `GatewayEvent` per line. Blank lines are skipped and malformed
/// lines are logged and dropped. The stream ends at EOF.
pub struct CliGateway {
    input: Mutex<Option<Input>>,
}

impl CliGateway {
    pub fn new() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }

    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        Self {
            input: Mutex::new(Some(Box::new(reader))),
        }
    }
}

impl Default for CliGateway {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode one input line. `Ok(None)` for blank lines.
pub fn decode_line(line: &str) -> Result<Option<GatewayEvent>, GatewayError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|e| GatewayError::InvalidEvent(e.to_string()))
}

#[async_trait]
impl Gateway for CliGateway {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<EventStream, GatewayError> {
        let input = self
            .input
            .lock()
            .ok()
            .and_then(|mut input| input.take())
            .ok_or_else(|| GatewayError::StartupFailed {
                name: "cli".to_string(),
                reason: "input already consumed".to_string(),
            })?;

        let stream = LinesStream::new(input.lines())
            .map_while(|line| match line {
                Ok(line) => Some(line),
                Err(e) => {
                    error!("Error reading gateway input: {}", e);
                    None
                }
            })
            .filter_map(|line| match decode_line(&line) {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, "Skipping malformed event");
                    None
                }
            });

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[tokio::test]
    async fn skips_blank_and_malformed_lines() {
        let input = concat!(
            r#"{"type":"member_join","guild_id":"g","user_id":"u1"}"#,
            "\n\n",
            "not json\n",
            r#"{"type":"no_such_event","guild_id":"g"}"#,
            "\n",
            r#"{"type":"member_leave","guild_id":"g","user_id":"u1"}"#,
            "\n",
        );
        let gateway = CliGateway::from_reader(Cursor::new(input.as_bytes().to_vec()));

        let events: Vec<GatewayEvent> = gateway.start().await.unwrap().collect().await;

        let kinds: Vec<&str> = events.iter().map(GatewayEvent::kind).collect();
        assert_eq!(kinds, ["member_join", "member_leave"]);
    }

    #[tokio::test]
    async fn second_start_fails() {
        let gateway = CliGateway::from_reader(Cursor::new(Vec::new()));
        assert!(gateway.start().await.is_ok());
        assert!(matches!(
            gateway.start().await,
            Err(GatewayError::StartupFailed { .. })
        ));
    }

    #[test]
    fn decode_line_reports_bad_json() {
        assert!(decode_line("   ").unwrap().is_none());
        assert!(matches!(
            decode_line("{"),
            Err(GatewayError::InvalidEvent(_))
        ));
    }
}
