//! Turns a confirmed editor form into the remote calls it implies.

use shared::{domain::EndpointConfiguration, protocol::RemoteOperation};

use crate::{alarm_codec::AlarmTypeCodec, error::EditorError, form::EditorForm};

/// Retry count sent with every new alarm.
pub const ALARM_RETRY_COUNT: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct ReconcilePlan {
    /// Subscription operation first, then alarm operation; at most one each.
    pub operations: Vec<RemoteOperation>,
    /// Set when the alarm half was rejected; the subscription half still runs.
    pub alarm_rejection: Option<EditorError>,
}

/// Computes the calls needed to move `current` to what `form` asks for.
///
/// An invalid interval rejects the whole confirm. An invalid alarm half only
/// drops the alarm operation and is reported through `alarm_rejection`.
pub fn plan(
    current: &EndpointConfiguration,
    form: &EditorForm,
    codec: &AlarmTypeCodec,
) -> Result<ReconcilePlan, EditorError> {
    let mut operations = Vec::with_capacity(2);

    if let Some(op) = plan_subscription(current, form)? {
        operations.push(op);
    }

    let alarm_rejection = match plan_alarm(current, form, codec) {
        Ok(Some(op)) => {
            operations.push(op);
            None
        }
        Ok(None) => None,
        Err(err) => Some(err),
    };

    Ok(ReconcilePlan {
        operations,
        alarm_rejection,
    })
}

fn plan_subscription(
    current: &EndpointConfiguration,
    form: &EditorForm,
) -> Result<Option<RemoteOperation>, EditorError> {
    let endpoint = current.endpoint().clone();

    if current.is_subscribed() && !form.subscribe_checked {
        return Ok(Some(RemoteOperation::Unsubscribe { endpoint }));
    }
    if !form.subscribe_checked {
        return Ok(None);
    }

    let interval_seconds = parse_interval(&form.interval_text)?;
    let interval_changed = current.subscription_interval() != Some(interval_seconds);
    if !current.is_subscribed() || interval_changed {
        Ok(Some(RemoteOperation::Subscribe {
            endpoint,
            interval_seconds,
        }))
    } else {
        Ok(None)
    }
}

fn plan_alarm(
    current: &EndpointConfiguration,
    form: &EditorForm,
    codec: &AlarmTypeCodec,
) -> Result<Option<RemoteOperation>, EditorError> {
    let endpoint = current.endpoint().clone();

    if let Some(existing) = current.active_alarm() {
        // Checked here reads "Remove alarm".
        return Ok(form.alarm_checked.then(|| RemoteOperation::RemoveAlarm {
            endpoint,
            kind: existing.kind,
        }));
    }
    if !form.alarm_checked {
        return Ok(None);
    }

    let threshold = parse_threshold(&form.threshold_text)?;
    let label = form
        .alarm_kind
        .as_deref()
        .ok_or(EditorError::MissingAlarmKind)?;
    let kind = codec
        .kind_of(label)
        .map_err(|_| EditorError::UnknownAlarmLabel {
            label: label.to_string(),
        })?;

    Ok(Some(RemoteOperation::CreateAlarm {
        endpoint,
        kind,
        retry_count: ALARM_RETRY_COUNT,
        threshold,
    }))
}

/// Accepts ASCII digits only: no sign, no whitespace, no empty string.
pub fn parse_interval(text: &str) -> Result<u32, EditorError> {
    let invalid = || EditorError::InvalidInterval {
        input: text.to_string(),
    };
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    text.parse().map_err(|_| invalid())
}

/// Accepts any finite decimal, surrounding whitespace ignored.
pub fn parse_threshold(text: &str) -> Result<f64, EditorError> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| EditorError::InvalidThreshold {
            input: text.to_string(),
        })
}
