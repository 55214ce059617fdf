use shared::domain::{AlarmKind, UnknownAlarmKind};

/// Maps alarm kinds to the display labels offered in the kind selector.
///
/// Labels are compared lower-cased against the kind's wire string, so
/// `"Above"`, `"ABOVE"` and `"above"` all name [`AlarmKind::Above`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmTypeCodec {
    labels: Vec<String>,
}

impl Default for AlarmTypeCodec {
    fn default() -> Self {
        Self::new(
            ["Above", "Below", "Change", "Delta"]
                .into_iter()
                .map(String::from)
                .collect(),
        )
    }
}

impl AlarmTypeCodec {
    pub fn new(labels: Vec<String>) -> Self {
        Self { labels }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Falls back to the wire string when the label list has no entry for `kind`.
    pub fn label_of(&self, kind: AlarmKind) -> &str {
        self.position_of(kind)
            .map(|idx| self.labels[idx].as_str())
            .unwrap_or(kind.as_str())
    }

    pub fn kind_of(&self, label: &str) -> Result<AlarmKind, UnknownAlarmKind> {
        label.parse()
    }

    /// Label to preselect: the one matching `kind`, otherwise the first.
    /// `None` only when the label list is empty.
    pub fn selection_for(&self, kind: Option<AlarmKind>) -> Option<&str> {
        let idx = kind.and_then(|kind| self.position_of(kind)).unwrap_or(0);
        self.labels.get(idx).map(String::as_str)
    }

    fn position_of(&self, kind: AlarmKind) -> Option<usize> {
        self.labels
            .iter()
            .position(|label| label.to_lowercase() == kind.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_round_trip_holds_for_every_kind() {
        let codec = AlarmTypeCodec::default();
        for kind in AlarmKind::ALL {
            assert_eq!(codec.kind_of(codec.label_of(kind)), Ok(kind));
        }
    }

    #[test]
    fn round_trip_holds_when_labels_are_missing() {
        let codec = AlarmTypeCodec::new(vec!["Above".into()]);
        for kind in AlarmKind::ALL {
            assert_eq!(codec.kind_of(codec.label_of(kind)), Ok(kind));
        }
        assert_eq!(codec.label_of(AlarmKind::Delta), "delta");
    }

    #[test]
    fn labels_match_case_insensitively() {
        let codec = AlarmTypeCodec::new(vec!["ABOVE".into(), "below".into()]);
        assert_eq!(codec.label_of(AlarmKind::Above), "ABOVE");
        assert_eq!(codec.kind_of("Below"), Ok(AlarmKind::Below));
    }

    #[test]
    fn unknown_label_is_rejected() {
        let codec = AlarmTypeCodec::default();
        assert!(codec.kind_of("Sometimes").is_err());
    }

    #[test]
    fn selection_defaults_to_first_label() {
        let codec = AlarmTypeCodec::default();
        assert_eq!(codec.selection_for(None), Some("Above"));
        assert_eq!(codec.selection_for(Some(AlarmKind::Change)), Some("Change"));
        assert_eq!(AlarmTypeCodec::new(Vec::new()).selection_for(None), None);
    }
}
