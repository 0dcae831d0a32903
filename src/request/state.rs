// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Request lifecycle states

use std::fmt;

use serde::{Deserialize, Serialize};

/// Request lifecycle, totally ordered.
///
/// Within one open/send cycle the state only moves forward; `open()` resets
/// it to `Unsent`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum ReadyState {
    /// Created or reopened, not yet connected
    #[default]
    Unsent = 0,
    /// Engine connected
    Opened = 1,
    /// Response headers available
    HeadersReceived = 2,
    /// Receiving body, partial data available
    Loading = 3,
    /// Complete or failed
    Done = 4,
}

impl ReadyState {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// `open()` is only legal before a transfer starts or after it ends
    pub fn can_open(self) -> bool {
        matches!(self, ReadyState::Unsent | ReadyState::Done)
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReadyState::Unsent => "unsent",
            ReadyState::Opened => "opened",
            ReadyState::HeadersReceived => "headers-received",
            ReadyState::Loading => "loading",
            ReadyState::Done => "done",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(ReadyState::Unsent < ReadyState::Opened);
        assert!(ReadyState::Opened < ReadyState::HeadersReceived);
        assert!(ReadyState::HeadersReceived < ReadyState::Loading);
        assert!(ReadyState::Loading < ReadyState::Done);
        assert_eq!(ReadyState::Loading.as_u8(), 3);
    }

    #[test]
    fn test_can_open() {
        assert!(ReadyState::Unsent.can_open());
        assert!(ReadyState::Done.can_open());
        assert!(!ReadyState::Opened.can_open());
        assert!(!ReadyState::Loading.can_open());
    }
}
