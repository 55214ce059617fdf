//! Editor form state for one endpoint.

use serde::Serialize;
use shared::domain::{format_threshold, EndpointConfiguration};
use tracing::debug;

use crate::alarm_codec::AlarmTypeCodec;

pub const CREATE_ALARM_LABEL: &str = "Create alarm";
pub const REMOVE_ALARM_LABEL: &str = "Remove alarm";

/// What the user sees and edits before confirming. The confirm action reads
/// only these fields plus the cached configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditorForm {
    pub title: String,
    pub subscribe_checked: bool,
    pub interval_text: String,
    /// Doubles as "remove the existing alarm" once an alarm is recorded.
    pub alarm_checked: bool,
    pub alarm_action_label: &'static str,
    /// Selected label from the kind selector; `None` means no selection.
    pub alarm_kind: Option<String>,
    pub threshold_text: String,
    pub alarm_summary: String,
}

impl EditorForm {
    pub fn open(
        config: &EndpointConfiguration,
        default_interval_raw: &str,
        codec: &AlarmTypeCodec,
    ) -> Self {
        let interval = config
            .subscription_interval()
            .unwrap_or_else(|| parse_default_interval(default_interval_raw));
        let alarm = config.alarm.as_present();
        let has_alarm = config.has_created_alarm();

        Self {
            title: format!("Endpoint: {}", config.endpoint()),
            subscribe_checked: config.is_subscribed(),
            interval_text: interval.to_string(),
            alarm_checked: has_alarm,
            alarm_action_label: if has_alarm {
                REMOVE_ALARM_LABEL
            } else {
                CREATE_ALARM_LABEL
            },
            alarm_kind: codec
                .selection_for(alarm.map(|a| a.kind))
                .map(str::to_string),
            threshold_text: format_threshold(alarm.map_or(0.0, |a| a.threshold)),
            alarm_summary: config.alarm_summary(),
        }
    }

    pub fn interval_editable(&self) -> bool {
        self.subscribe_checked
    }

    /// The threshold box is disabled for `Change` alarms and while the alarm
    /// box is unchecked.
    pub fn threshold_editable(&self, codec: &AlarmTypeCodec) -> bool {
        self.alarm_checked
            && self
                .alarm_kind
                .as_deref()
                .and_then(|label| codec.kind_of(label).ok())
                .is_some_and(|kind| kind.uses_threshold())
    }
}

/// Parses the configured default interval; anything unparsable becomes `0`.
pub fn parse_default_interval(raw: &str) -> u32 {
    raw.parse().unwrap_or_else(|_| {
        debug!(raw, "editor: failed to parse default interval, using 0");
        0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{AlarmKind, EndpointName, SubState, SubscriptionConfig};

    fn config() -> EndpointConfiguration {
        EndpointConfiguration::new(EndpointName::new("EngineSpeed"))
    }

    #[test]
    fn fresh_endpoint_uses_default_interval() {
        let form = EditorForm::open(&config(), "25", &AlarmTypeCodec::default());
        assert_eq!(form.title, "Endpoint: EngineSpeed");
        assert!(!form.subscribe_checked);
        assert!(!form.interval_editable());
        assert_eq!(form.interval_text, "25");
        assert!(!form.alarm_checked);
        assert_eq!(form.alarm_action_label, CREATE_ALARM_LABEL);
        assert_eq!(form.alarm_kind.as_deref(), Some("Above"));
        assert_eq!(form.threshold_text, "0.0");
        assert_eq!(form.alarm_summary, "No alarm yet");
    }

    #[test]
    fn unparsable_default_interval_becomes_zero() {
        for raw in ["", "ten", "-3", "2.5"] {
            let form = EditorForm::open(&config(), raw, &AlarmTypeCodec::default());
            assert_eq!(form.interval_text, "0", "raw={raw:?}");
        }
    }

    #[test]
    fn recorded_interval_wins_over_default_even_when_inactive() {
        let mut cfg = config();
        cfg.subscription = SubState::Present(SubscriptionConfig {
            is_active: false,
            interval_seconds: 45,
        });
        let form = EditorForm::open(&cfg, "10", &AlarmTypeCodec::default());
        assert!(!form.subscribe_checked);
        assert_eq!(form.interval_text, "45");
    }

    #[test]
    fn existing_alarm_prechecks_removal() {
        let mut cfg = config();
        cfg.mark_subscribed(5);
        cfg.mark_alarm_created(AlarmKind::Below, 700.0);
        let form = EditorForm::open(&cfg, "10", &AlarmTypeCodec::default());
        assert!(form.subscribe_checked);
        assert!(form.interval_editable());
        assert!(form.alarm_checked);
        assert_eq!(form.alarm_action_label, REMOVE_ALARM_LABEL);
        assert_eq!(form.alarm_kind.as_deref(), Some("Below"));
        assert_eq!(form.threshold_text, "700.0");
    }

    #[test]
    fn threshold_disabled_for_change_alarms() {
        let codec = AlarmTypeCodec::default();
        let mut form = EditorForm::open(&config(), "10", &codec);
        assert!(!form.threshold_editable(&codec));

        form.alarm_checked = true;
        assert!(form.threshold_editable(&codec));

        form.alarm_kind = Some("Change".into());
        assert!(!form.threshold_editable(&codec));

        form.alarm_kind = None;
        assert!(!form.threshold_editable(&codec));
    }
}
