//! Stdio transport for plan runs: events stream to stdout as JSON lines,
//! decisions are read from stdin.

use async_trait::async_trait;
use draftsmith_orchestrator::{ChannelError, Received, SessionChannel};
use draftsmith_protocol::{Decision, DocType, RunEvent};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Session channel over the process's stdio.
///
/// With `auto_continue`, every gate resolves to Continue without consulting
/// stdin (the `--yes` flow).
pub struct StdioSessionChannel {
    stdin: Lines<BufReader<Stdin>>,
    auto_continue: bool,
    closed: bool,
}

impl StdioSessionChannel {
    pub fn new(auto_continue: bool) -> Self {
        Self {
            stdin: BufReader::new(tokio::io::stdin()).lines(),
            auto_continue,
            closed: false,
        }
    }

    async fn read_decision(&mut self) -> Received {
        loop {
            eprintln!("decision? [continue/stop/skip/retry <doc-type>]");
            match self.stdin.next_line().await {
                Ok(Some(line)) => match parse_decision(&line) {
                    Some(decision) => return Received::Decision(decision),
                    None => {
                        eprintln!("unrecognized decision: {line:?}");
                    }
                },
                Ok(None) => return Received::Closed,
                Err(_) => return Received::Closed,
            }
        }
    }
}

/// Parse a decision line. Unrecognized input returns `None` so the caller
/// can re-prompt; the wire-level "invalid decision" failure is reserved for
/// structurally valid but inapplicable decisions (e.g. retry outside the
/// current step).
pub fn parse_decision(line: &str) -> Option<Decision> {
    let mut words = line.trim().split_whitespace();
    match words.next()?.to_ascii_lowercase().as_str() {
        "continue" | "c" | "next" => Some(Decision::Continue),
        "stop" | "q" | "quit" => Some(Decision::Stop),
        "skip" | "s" => Some(Decision::Skip),
        "retry" | "r" => {
            let doc_type = DocType::parse(words.next()?).ok()?;
            Some(Decision::Retry { doc_type })
        }
        _ => None,
    }
}

#[async_trait]
impl SessionChannel for StdioSessionChannel {
    async fn send(&mut self, event: RunEvent) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        // JSON lines on stdout; logging stays on stderr and the log file.
        match serde_json::to_string(&event) {
            Ok(line) => {
                println!("{line}");
                Ok(())
            }
            Err(_) => Err(ChannelError::Closed),
        }
    }

    async fn receive(&mut self, timeout: Option<Duration>) -> Received {
        if self.auto_continue {
            return Received::Decision(Decision::Continue);
        }
        match timeout {
            Some(duration) => match tokio::time::timeout(duration, self.read_decision()).await {
                Ok(received) => received,
                Err(_) => Received::TimedOut,
            },
            None => self.read_decision().await,
        }
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decisions_and_aliases() {
        assert_eq!(parse_decision("continue"), Some(Decision::Continue));
        assert_eq!(parse_decision("  C "), Some(Decision::Continue));
        assert_eq!(parse_decision("stop"), Some(Decision::Stop));
        assert_eq!(parse_decision("skip"), Some(Decision::Skip));
        assert_eq!(
            parse_decision("retry uiux-wireframe"),
            Some(Decision::Retry {
                doc_type: DocType::new("uiux-wireframe")
            })
        );
        assert_eq!(parse_decision("retry"), None);
        assert_eq!(parse_decision("retry bad_type!"), None);
        assert_eq!(parse_decision("frobnicate"), None);
    }
}
