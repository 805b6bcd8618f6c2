//! The event & decision channel between a plan run and its client.
//!
//! One bidirectional channel per run. The executor is the only writer of
//! events and the only closer; the client sends decisions. Transport
//! (WebSocket, in-process, test harness) lives behind [`SessionChannel`].

use async_trait::async_trait;
use draftsmith_protocol::{Decision, RunEvent};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;

/// What a decision wait produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    Decision(Decision),
    /// The configured gate timeout elapsed.
    TimedOut,
    /// The far side went away; no more decisions will arrive.
    Closed,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChannelError {
    #[error("session channel closed")]
    Closed,
}

/// One run's bidirectional session channel.
///
/// Guarantees required of implementations: events are delivered in emission
/// order; `receive` is only called with at most one outstanding
/// `await_decision`; `close` is idempotent and ends the event stream.
#[async_trait]
pub trait SessionChannel: Send {
    async fn send(&mut self, event: RunEvent) -> Result<(), ChannelError>;

    /// Wait for the next decision, up to `timeout` when given.
    async fn receive(&mut self, timeout: Option<Duration>) -> Received;

    fn close(&mut self);
}

/// In-process implementation over a pair of tokio mpsc channels.
pub struct MpscSessionChannel {
    events_tx: Option<mpsc::Sender<RunEvent>>,
    decisions_rx: mpsc::Receiver<Decision>,
}

/// The client half: consumes events, submits decisions.
pub struct SessionClient {
    events_rx: mpsc::Receiver<RunEvent>,
    decisions_tx: mpsc::Sender<Decision>,
}

/// Create a connected (executor, client) channel pair.
pub fn session_pair(capacity: usize) -> (MpscSessionChannel, SessionClient) {
    let (events_tx, events_rx) = mpsc::channel(capacity);
    let (decisions_tx, decisions_rx) = mpsc::channel(capacity);
    (
        MpscSessionChannel {
            events_tx: Some(events_tx),
            decisions_rx,
        },
        SessionClient {
            events_rx,
            decisions_tx,
        },
    )
}

#[async_trait]
impl SessionChannel for MpscSessionChannel {
    async fn send(&mut self, event: RunEvent) -> Result<(), ChannelError> {
        match &self.events_tx {
            Some(tx) => tx.send(event).await.map_err(|_| ChannelError::Closed),
            None => Err(ChannelError::Closed),
        }
    }

    async fn receive(&mut self, timeout: Option<Duration>) -> Received {
        match timeout {
            Some(duration) => match tokio::time::timeout(duration, self.decisions_rx.recv()).await
            {
                Ok(Some(decision)) => Received::Decision(decision),
                Ok(None) => Received::Closed,
                Err(_) => Received::TimedOut,
            },
            None => match self.decisions_rx.recv().await {
                Some(decision) => Received::Decision(decision),
                None => Received::Closed,
            },
        }
    }

    fn close(&mut self) {
        // Dropping the sender ends the client's event stream.
        self.events_tx = None;
        self.decisions_rx.close();
    }
}

impl SessionClient {
    /// Next event, or `None` once the executor has closed the run.
    pub async fn next_event(&mut self) -> Option<RunEvent> {
        self.events_rx.recv().await
    }

    /// Submit a decision. Returns false if the run has already ended.
    pub async fn decide(&self, decision: Decision) -> bool {
        self.decisions_tx.send(decision).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draftsmith_protocol::DocType;

    #[tokio::test]
    async fn events_arrive_in_emission_order() {
        let (mut channel, mut client) = session_pair(8);
        channel
            .send(RunEvent::StepStart { index: 1, total: 1 })
            .await
            .unwrap();
        channel
            .send(RunEvent::DocStart {
                doc_type: DocType::new("srs"),
                display_name: "Software Requirements Specification".to_string(),
            })
            .await
            .unwrap();
        channel.close();

        assert_eq!(
            client.next_event().await,
            Some(RunEvent::StepStart { index: 1, total: 1 })
        );
        assert!(matches!(
            client.next_event().await,
            Some(RunEvent::DocStart { .. })
        ));
        assert_eq!(client.next_event().await, None);
    }

    #[tokio::test]
    async fn receive_reports_timeout_and_closure() {
        let (mut channel, client) = session_pair(1);
        assert_eq!(
            channel.receive(Some(Duration::from_millis(20))).await,
            Received::TimedOut
        );

        drop(client);
        assert_eq!(channel.receive(None).await, Received::Closed);
    }

    #[tokio::test]
    async fn send_after_close_fails() {
        let (mut channel, _client) = session_pair(1);
        channel.close();
        assert_eq!(
            channel.send(RunEvent::RunCompleted).await,
            Err(ChannelError::Closed)
        );
    }

    #[tokio::test]
    async fn decisions_flow_back() {
        let (mut channel, client) = session_pair(4);
        assert!(client.decide(Decision::Continue).await);
        assert_eq!(
            channel.receive(None).await,
            Received::Decision(Decision::Continue)
        );
    }
}
