//! Single-consumer run message queue
//!
//! The sender side cannot emit a terminal message except through
//! [`RunSender::finish`], which consumes it. The stream side ends right after
//! the terminal message and synthesizes one if the sender vanished without
//! finishing, so consumers always observe exactly one `Finished`.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::{BridgeMessage, KeywordCallback, RunOutcome};

/// Creates a connected sender/stream pair for one run.
pub fn run_channel() -> (RunSender, RunStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        RunSender { tx },
        RunStream {
            inner: UnboundedReceiverStream::new(rx),
            finished: false,
        },
    )
}

/// Producer half of a run. The `bool` results report whether the consumer
/// is still listening.
#[derive(Debug)]
pub struct RunSender {
    tx: mpsc::UnboundedSender<BridgeMessage>,
}

impl RunSender {
    pub fn output(&self, text: impl Into<String>) -> bool {
        self.send(BridgeMessage::StdOutput(text.into()))
    }

    pub fn report(&self, html: impl Into<String>) -> bool {
        self.send(BridgeMessage::HtmlReport(html.into()))
    }

    pub fn keyword_callback(&self, callback: KeywordCallback) -> bool {
        self.send(BridgeMessage::KeywordCallback(callback))
    }

    /// True once the consumer has dropped the stream.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolves when the consumer drops the stream.
    pub async fn closed(&self) {
        self.tx.closed().await
    }

    /// Sends the terminal message.
    pub fn finish(self, outcome: RunOutcome) {
        let _ = self.tx.send(BridgeMessage::Finished(outcome));
    }

    fn send(&self, message: BridgeMessage) -> bool {
        self.tx.send(message).is_ok()
    }
}

/// Consumer half of a run.
#[derive(Debug)]
pub struct RunStream {
    inner: UnboundedReceiverStream<BridgeMessage>,
    finished: bool,
}

impl Stream for RunStream {
    type Item = BridgeMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.as_mut().get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        match Pin::new(&mut this.inner).poll_next(cx) {
            Poll::Ready(Some(message)) => {
                if matches!(message, BridgeMessage::Finished(_)) {
                    this.finished = true;
                }
                Poll::Ready(Some(message))
            }
            Poll::Ready(None) => {
                this.finished = true;
                Poll::Ready(Some(BridgeMessage::Finished(RunOutcome::TransportFailed(
                    "execution bridge closed without completing the run".to_string(),
                ))))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
