use serde::{Deserialize, Serialize};

use crate::domain::{AlarmKind, EndpointConfiguration, EndpointName};

/// Buffering policy requested for every subscription and alarm.
pub const DEFAULT_BUFFER: &str = "queue";

/// One remote call decided on by the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum RemoteOperation {
    Subscribe {
        endpoint: EndpointName,
        interval_seconds: u32,
    },
    Unsubscribe {
        endpoint: EndpointName,
    },
    CreateAlarm {
        endpoint: EndpointName,
        kind: AlarmKind,
        retry_count: u32,
        threshold: f64,
    },
    RemoveAlarm {
        endpoint: EndpointName,
        kind: AlarmKind,
    },
}

impl RemoteOperation {
    pub fn endpoint(&self) -> &EndpointName {
        match self {
            RemoteOperation::Subscribe { endpoint, .. }
            | RemoteOperation::Unsubscribe { endpoint }
            | RemoteOperation::CreateAlarm { endpoint, .. }
            | RemoteOperation::RemoveAlarm { endpoint, .. } => endpoint,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RemoteOperation::Subscribe { .. } => "subscribe",
            RemoteOperation::Unsubscribe { .. } => "unsubscribe",
            RemoteOperation::CreateAlarm { .. } => "create_alarm",
            RemoteOperation::RemoveAlarm { .. } => "remove_alarm",
        }
    }

    pub fn success_message(&self) -> String {
        let endpoint = self.endpoint();
        match self {
            RemoteOperation::Subscribe { .. } => format!("Subscribed to {endpoint}"),
            RemoteOperation::Unsubscribe { .. } => format!("Unsubscribed from {endpoint}"),
            RemoteOperation::CreateAlarm { .. } => format!("Created alarm for {endpoint}"),
            RemoteOperation::RemoveAlarm { .. } => format!("Removed alarm from {endpoint}"),
        }
    }

    pub fn failure_message(&self) -> String {
        let endpoint = self.endpoint();
        match self {
            RemoteOperation::Subscribe { .. } => format!("Failed to subscribe to {endpoint}"),
            RemoteOperation::Unsubscribe { .. } => {
                format!("Failed to unsubscribe from {endpoint}")
            }
            RemoteOperation::CreateAlarm { .. } => format!("Failed to create alarm for {endpoint}"),
            RemoteOperation::RemoveAlarm { .. } => {
                format!("Failed to remove alarm from {endpoint}")
            }
        }
    }

    /// Records an acknowledged operation in the local cache.
    pub fn apply_to(&self, config: &mut EndpointConfiguration) {
        match self {
            RemoteOperation::Subscribe {
                interval_seconds, ..
            } => config.mark_subscribed(*interval_seconds),
            RemoteOperation::Unsubscribe { .. } => config.mark_unsubscribed(),
            RemoteOperation::CreateAlarm {
                kind, threshold, ..
            } => config.mark_alarm_created(*kind, *threshold),
            RemoteOperation::RemoveAlarm { .. } => config.mark_alarm_removed(),
        }
    }
}

/// `vehicle/data/<endpoint>` resource path the device streams from.
pub fn data_uri(endpoint: &EndpointName) -> String {
    format!("vehicle/data/{endpoint}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionBody {
    pub uri: String,
    pub buffer: String,
    pub interval: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub subscription: SubscriptionBody,
}

impl SubscriptionRequest {
    pub fn new(endpoint: &EndpointName, interval_seconds: u32) -> Self {
        Self {
            subscription: SubscriptionBody {
                uri: data_uri(endpoint),
                buffer: DEFAULT_BUFFER.to_string(),
                interval: interval_seconds,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmBody {
    pub uri: String,
    pub buffer: String,
    #[serde(rename = "type")]
    pub kind: AlarmKind,
    pub threshold: f64,
    /// Minimum seconds between repeated notifications.
    pub interval: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmRequest {
    pub alarm: AlarmBody,
}

impl AlarmRequest {
    pub fn new(endpoint: &EndpointName, kind: AlarmKind, retry_count: u32, threshold: f64) -> Self {
        Self {
            alarm: AlarmBody {
                uri: data_uri(endpoint),
                buffer: DEFAULT_BUFFER.to_string(),
                kind,
                threshold,
                interval: retry_count,
            },
        }
    }
}
