//! Forwarding of run messages to the client

use async_trait::async_trait;
use tower_lsp::Client;
use tower_lsp::lsp_types::MessageType;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::execution::{BridgeMessage, KeywordAction, RunOutcome, RunSink, sanitize_report};
use crate::lsp::notifications::{
    KeywordCallbackNotification, KeywordCallbackParams, RunFinished, RunFinishedParams, RunOutput,
    RunOutputParams, RunReport, RunReportParams,
};

/// Turns run messages into client notifications.
#[derive(Clone)]
pub struct ClientRunSink {
    client: Client,
}

impl ClientRunSink {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RunSink for ClientRunSink {
    async fn deliver(&self, run_id: Uuid, message: &BridgeMessage) {
        let run_id_str = run_id.to_string();
        match message {
            BridgeMessage::StdOutput(text) => {
                self.client
                    .send_notification::<RunOutput>(RunOutputParams {
                        run_id: run_id_str,
                        text: text.clone(),
                    })
                    .await;
            }
            BridgeMessage::HtmlReport(html) => {
                self.client
                    .send_notification::<RunReport>(RunReportParams {
                        run_id: run_id_str,
                        html: sanitize_report(html),
                    })
                    .await;
            }
            BridgeMessage::KeywordCallback(callback) => {
                match KeywordAction::from_callback(callback) {
                    Ok(KeywordAction::Unknown(keyword)) => warn!("Unknown keyword: {}", keyword),
                    Ok(action) => debug!("Run {} requests {:?}", run_id, action),
                    Err(e) => warn!("Malformed keyword callback: {}", e),
                }
                self.client
                    .send_notification::<KeywordCallbackNotification>(KeywordCallbackParams {
                        run_id: run_id_str,
                        callback: callback.clone(),
                    })
                    .await;
            }
            BridgeMessage::Finished(outcome) => {
                let (success, exit_code) = match outcome {
                    RunOutcome::Completed { exit_code } => (true, *exit_code),
                    RunOutcome::TransportFailed(_) => (false, None),
                };
                self.client
                    .send_notification::<RunFinished>(RunFinishedParams {
                        run_id: run_id_str,
                        success,
                        exit_code,
                        message: Some(outcome.summary()),
                    })
                    .await;
                if !success {
                    self.client.show_message(MessageType::ERROR, outcome.summary()).await;
                }
            }
        }
    }
}
