//! Wire shape of the XEmbed protocol messages exchanged with embedded clients.
//!
//! Every message is a format-32 `_XEMBED` client message whose five data
//! words are `[timestamp, kind, detail, data1, data2]`.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

use super::window_server::WindowId;

/// Timestamp placeholder meaning "now" to the X server.
pub const CURRENT_TIME: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum XEmbedMessage {
    EmbeddedNotify = 0,
    WindowActivate = 1,
    WindowDeactivate = 2,
    RequestFocus = 3,
    FocusIn = 4,
    FocusOut = 5,
    FocusNext = 6,
    FocusPrev = 7,
    // 8 and 9 were GRAB_KEY / UNGRAB_KEY and are no longer assigned.
    ModalityOn = 10,
    ModalityOff = 11,
    RegisterAccelerator = 12,
    UnregisterAccelerator = 13,
    ActivateAccelerator = 14,
}

/// Detail word of [`XEmbedMessage::FocusIn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum FocusDetail {
    Current = 0,
    First = 1,
    Last = 2,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("unknown XEmbed message kind {0}")]
    UnknownMessage(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedMessage {
    pub timestamp: u32,
    pub kind: XEmbedMessage,
    pub detail: u32,
    pub data1: u32,
    pub data2: u32,
}

impl EmbedMessage {
    pub fn new(kind: XEmbedMessage) -> Self {
        Self {
            timestamp: CURRENT_TIME,
            kind,
            detail: 0,
            data1: 0,
            data2: 0,
        }
    }

    pub fn focus_in(detail: FocusDetail) -> Self {
        Self {
            detail: detail.into(),
            ..Self::new(XEmbedMessage::FocusIn)
        }
    }

    /// Announces that `embedder` has taken over the client; `data1` carries
    /// the embedder's window.
    pub fn embedded_notify(embedder: WindowId) -> Self {
        Self {
            data1: embedder,
            ..Self::new(XEmbedMessage::EmbeddedNotify)
        }
    }

    pub fn focus_detail(&self) -> Option<FocusDetail> {
        match self.kind {
            XEmbedMessage::FocusIn => FocusDetail::try_from(self.detail).ok(),
            _ => None,
        }
    }

    pub fn to_data32(&self) -> [u32; 5] {
        [self.timestamp, self.kind.into(), self.detail, self.data1, self.data2]
    }

    pub fn from_data32(data: [u32; 5]) -> Result<Self, ProtocolError> {
        let [timestamp, kind, detail, data1, data2] = data;
        let kind = XEmbedMessage::try_from(kind).map_err(|_| ProtocolError::UnknownMessage(kind))?;
        Ok(Self { timestamp, kind, detail, data1, data2 })
    }
}
