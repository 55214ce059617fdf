//! Decides whether the host is on a network where device calls make sense.

use tracing::warn;

/// Platform model reported by the emulator image. Emulators have no Wi-Fi
/// stack, so they are always allowed through.
pub const EMULATOR_MODEL: &str = "sdk";

pub trait EnvironmentProbe: Send + Sync {
    fn platform_model(&self) -> String;
    fn wifi_connected(&self) -> bool;
    /// `None` when the platform cannot report hotspot state.
    fn access_point_enabled(&self) -> Option<bool>;
}

/// True on the emulator, or when the host is associated with a Wi-Fi network
/// or is itself serving as a Wi-Fi hotspot.
pub fn is_connectable<P: EnvironmentProbe + ?Sized>(probe: &P) -> bool {
    if probe.platform_model() == EMULATOR_MODEL {
        return true;
    }

    probe.wifi_connected() || tethering_active(probe)
}

fn tethering_active<P: EnvironmentProbe + ?Sized>(probe: &P) -> bool {
    match probe.access_point_enabled() {
        Some(enabled) => enabled,
        None => {
            warn!("connectivity: access point state unavailable, assuming not tethering");
            false
        }
    }
}

/// Probe backed by fixed values, typically read from settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticProbe {
    pub platform_model: String,
    pub wifi_connected: bool,
    pub access_point: Option<bool>,
}

impl EnvironmentProbe for StaticProbe {
    fn platform_model(&self) -> String {
        self.platform_model.clone()
    }

    fn wifi_connected(&self) -> bool {
        self.wifi_connected
    }

    fn access_point_enabled(&self) -> Option<bool> {
        self.access_point
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe(model: &str, wifi: bool, access_point: Option<bool>) -> StaticProbe {
        StaticProbe {
            platform_model: model.to_string(),
            wifi_connected: wifi,
            access_point,
        }
    }

    #[test]
    fn emulator_is_always_connectable() {
        for wifi in [false, true] {
            for ap in [None, Some(false), Some(true)] {
                assert!(is_connectable(&probe(EMULATOR_MODEL, wifi, ap)));
            }
        }
    }

    #[test]
    fn wifi_association_allows_calls() {
        assert!(is_connectable(&probe("pixel", true, Some(false))));
    }

    #[test]
    fn hotspot_allows_calls_without_wifi() {
        assert!(is_connectable(&probe("pixel", false, Some(true))));
    }

    #[test]
    fn no_network_blocks_calls() {
        assert!(!is_connectable(&probe("pixel", false, Some(false))));
    }

    #[test]
    fn missing_access_point_probe_reads_as_not_tethering() {
        assert!(!is_connectable(&probe("pixel", false, None)));
        assert!(is_connectable(&probe("pixel", true, None)));
    }

    #[test]
    fn model_match_is_exact() {
        assert!(!is_connectable(&probe("SDK", false, Some(false))));
    }
}
