use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of a vehicle data endpoint, e.g. `EngineSpeed`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EndpointName(String);

impl EndpointName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmKind {
    Above,
    Below,
    Change,
    Delta,
}

impl AlarmKind {
    pub const ALL: [AlarmKind; 4] = [
        AlarmKind::Above,
        AlarmKind::Below,
        AlarmKind::Change,
        AlarmKind::Delta,
    ];

    /// Canonical lower-case form used on the wire and for label matching.
    pub fn as_str(self) -> &'static str {
        match self {
            AlarmKind::Above => "above",
            AlarmKind::Below => "below",
            AlarmKind::Change => "change",
            AlarmKind::Delta => "delta",
        }
    }

    /// `Change` alarms fire on any new value; the threshold is ignored.
    pub fn uses_threshold(self) -> bool {
        !matches!(self, AlarmKind::Change)
    }
}

impl fmt::Display for AlarmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown alarm kind: {0}")]
pub struct UnknownAlarmKind(pub String);

impl FromStr for AlarmKind {
    type Err = UnknownAlarmKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        AlarmKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered)
            .ok_or_else(|| UnknownAlarmKind(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionConfig {
    pub is_active: bool,
    pub interval_seconds: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlarmConfig {
    pub is_active: bool,
    pub kind: AlarmKind,
    pub threshold: f64,
}

/// A sub-record that has either never been recorded or is known.
///
/// `Absent` and `Present` with `is_active == false` both mean "off"; the
/// difference is whether an interval or threshold was ever recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "config", rename_all = "snake_case")]
pub enum SubState<T> {
    Absent,
    Present(T),
}

impl<T> Default for SubState<T> {
    fn default() -> Self {
        SubState::Absent
    }
}

impl<T> SubState<T> {
    pub fn as_present(&self) -> Option<&T> {
        match self {
            SubState::Absent => None,
            SubState::Present(value) => Some(value),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, SubState::Present(_))
    }
}

/// Locally cached subscription and alarm state for one endpoint.
///
/// The cache is updated optimistically after each acknowledged remote call
/// and is never reconciled against the device afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfiguration {
    endpoint: EndpointName,
    #[serde(default)]
    pub subscription: SubState<SubscriptionConfig>,
    #[serde(default)]
    pub alarm: SubState<AlarmConfig>,
}

impl EndpointConfiguration {
    pub fn new(endpoint: EndpointName) -> Self {
        Self {
            endpoint,
            subscription: SubState::Absent,
            alarm: SubState::Absent,
        }
    }

    pub fn endpoint(&self) -> &EndpointName {
        &self.endpoint
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription
            .as_present()
            .is_some_and(|sub| sub.is_active)
    }

    /// Last recorded interval, whether or not the subscription is active.
    pub fn subscription_interval(&self) -> Option<u32> {
        self.subscription.as_present().map(|sub| sub.interval_seconds)
    }

    pub fn has_created_alarm(&self) -> bool {
        self.active_alarm().is_some()
    }

    pub fn active_alarm(&self) -> Option<&AlarmConfig> {
        self.alarm.as_present().filter(|alarm| alarm.is_active)
    }

    pub fn mark_subscribed(&mut self, interval_seconds: u32) {
        match &mut self.subscription {
            SubState::Present(sub) => {
                sub.is_active = true;
                sub.interval_seconds = interval_seconds;
            }
            SubState::Absent => {
                self.subscription = SubState::Present(SubscriptionConfig {
                    is_active: true,
                    interval_seconds,
                });
            }
        }
    }

    pub fn mark_unsubscribed(&mut self) {
        if let SubState::Present(sub) = &mut self.subscription {
            sub.is_active = false;
        }
    }

    pub fn mark_alarm_created(&mut self, kind: AlarmKind, threshold: f64) {
        match &mut self.alarm {
            SubState::Present(alarm) => {
                alarm.is_active = true;
                alarm.kind = kind;
                alarm.threshold = threshold;
            }
            SubState::Absent => {
                self.alarm = SubState::Present(AlarmConfig {
                    is_active: true,
                    kind,
                    threshold,
                });
            }
        }
    }

    pub fn mark_alarm_removed(&mut self) {
        if let SubState::Present(alarm) = &mut self.alarm {
            alarm.is_active = false;
        }
    }

    pub fn alarm_summary(&self) -> String {
        let Some(alarm) = self.active_alarm() else {
            return "No alarm yet".to_string();
        };
        let threshold = format_threshold(alarm.threshold);
        match alarm.kind {
            AlarmKind::Above => format!("Alarm when value rises above {threshold}"),
            AlarmKind::Below => format!("Alarm when value falls below {threshold}"),
            AlarmKind::Change => "Alarm whenever the value changes".to_string(),
            AlarmKind::Delta => format!("Alarm when value changes by more than {threshold}"),
        }
    }
}

/// Formats a threshold the way the editor displays it: whole numbers keep
/// one decimal place (`50.0`), everything else uses the shortest form.
pub fn format_threshold(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
