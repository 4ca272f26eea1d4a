// Frame envelope and the closed set of actions exchanged with the backend

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::Snapshot;

/// `{id, action, payload}` in both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub payload: Value,
}

impl Frame {
    pub fn request(id: String, action: Action, payload: Value) -> Self {
        Self {
            id,
            action: action.as_str().to_string(),
            payload,
        }
    }

    pub fn to_text(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Client-initiated request/response actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Ping,
    GetLinkType,
    GetSummary,
    GetRules,
    SetRules,
    GetMatchList,
    GetBlackList,
    ChangeBlack,
    GetSystemResourceUsage,
    ChangeBroadcastStatus,
}

impl Action {
    pub const ALL: [Action; 10] = [
        Action::Ping,
        Action::GetLinkType,
        Action::GetSummary,
        Action::GetRules,
        Action::SetRules,
        Action::GetMatchList,
        Action::GetBlackList,
        Action::ChangeBlack,
        Action::GetSystemResourceUsage,
        Action::ChangeBroadcastStatus,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Ping => "ping",
            Action::GetLinkType => "get_link_type",
            Action::GetSummary => "get_summary",
            Action::GetRules => "get_rules",
            Action::SetRules => "set_rules",
            Action::GetMatchList => "get_match_list",
            Action::GetBlackList => "get_black_list",
            Action::ChangeBlack => "change_black",
            Action::GetSystemResourceUsage => "get_system_resource_usage",
            Action::ChangeBroadcastStatus => "change_broadcast_status",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.as_str() == s)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const CALLBACK: &str = "callback";
pub const CALLBACK_ERROR: &str = "callback-error";
pub const BROADCAST_SUMMARY: &str = "broadcast-summary";
pub const BROADCAST_BLACK: &str = "broadcast-black";

/// Inbound frame after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Callback { id: String, payload: Value },
    CallbackError { id: String, message: String },
    Summary(Box<Snapshot>),
    Blacklist(Value),
    /// Unparseable, missing action, unknown action, or a payload of the wrong shape.
    Malformed,
}

/// Classifies one text frame. Never fails: anything unusable is `Malformed`.
pub fn decode(text: &str) -> Inbound {
    let Ok(frame) = serde_json::from_str::<Frame>(text) else {
        return Inbound::Malformed;
    };
    match frame.action.as_str() {
        CALLBACK => Inbound::Callback {
            id: frame.id,
            payload: frame.payload,
        },
        CALLBACK_ERROR => Inbound::CallbackError {
            id: frame.id,
            message: error_message(frame.payload),
        },
        BROADCAST_SUMMARY => match serde_json::from_value::<Snapshot>(frame.payload) {
            Ok(snapshot) => Inbound::Summary(Box::new(snapshot)),
            Err(_) => Inbound::Malformed,
        },
        BROADCAST_BLACK => Inbound::Blacklist(frame.payload),
        _ => Inbound::Malformed,
    }
}

fn error_message(payload: Value) -> String {
    match payload {
        Value::String(s) => s,
        Value::Null => "unknown server error".to_string(),
        other => other.to_string(),
    }
}
