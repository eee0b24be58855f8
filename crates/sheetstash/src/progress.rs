// SPDX-FileCopyrightText: 2026 sheetstash contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Transfer progress reporting
//!
//! Observability only: events flow through an unbounded channel and a
//! dropped receiver never fails or blocks an operation.

use tokio::sync::mpsc;

/// Direction of a transfer being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upload,
    Download,
}

/// One bytes-transferred delta for an object.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub object: String,
    pub direction: Direction,
    pub bytes: u64,
}

pub type ProgressSender = mpsc::UnboundedSender<ProgressEvent>;
pub type ProgressReceiver = mpsc::UnboundedReceiver<ProgressEvent>;

/// Create a progress channel to attach to a store.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    mpsc::unbounded_channel()
}

pub(crate) fn emit(
    sender: Option<&ProgressSender>,
    object: &str,
    direction: Direction,
    bytes: u64,
) {
    if let Some(sender) = sender {
        // Send failure means the receiver is gone; progress is best-effort.
        let _ = sender.send(ProgressEvent {
            object: object.to_string(),
            direction,
            bytes,
        });
    }
}
