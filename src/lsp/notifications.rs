//! Custom server-to-client notifications for test runs
//!
//! All of them carry the `runId` returned by the `robot.run` command so a
//! client can tell runs apart.

use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::notification::Notification;

use crate::execution::KeywordCallback;

/// Console text produced by a run.
#[derive(Debug)]
pub enum RunOutput {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutputParams {
    pub run_id: String,
    pub text: String,
}

impl Notification for RunOutput {
    type Params = RunOutputParams;
    const METHOD: &'static str = "robot/output";
}

/// Full HTML log of a run, replacing any earlier one.
#[derive(Debug)]
pub enum RunReport {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReportParams {
    pub run_id: String,
    pub html: String,
}

impl Notification for RunReport {
    type Params = RunReportParams;
    const METHOD: &'static str = "robot/report";
}

/// Browser action requested by an in-page library.
#[derive(Debug)]
pub enum KeywordCallbackNotification {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordCallbackParams {
    pub run_id: String,
    pub callback: KeywordCallback,
}

impl Notification for KeywordCallbackNotification {
    type Params = KeywordCallbackParams;
    const METHOD: &'static str = "robot/keywordCallback";
}

/// Sent exactly once per run, after every other run notification.
#[derive(Debug)]
pub enum RunFinished {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunFinishedParams {
    pub run_id: String,
    /// False when the run could not be carried out.
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Notification for RunFinished {
    type Params = RunFinishedParams;
    const METHOD: &'static str = "robot/runFinished";
}
