//! Process-wide services handed to actors at construction

use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Default)]
struct AlarmState {
    raised: bool,
    source: Option<String>,
    times_raised: u32,
}

/// Shared world state read by every perception-driven actor
#[derive(Debug, Default)]
pub struct WorldServices {
    alarm: RwLock<AlarmState>,
}

impl WorldServices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience for the usual shared handle
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Set the global alarm. Raising an active alarm keeps its first source.
    pub fn raise_alarm(&self, source: &str) {
        let mut alarm = self.alarm.write();
        if alarm.raised {
            return;
        }
        alarm.raised = true;
        alarm.source = Some(source.to_owned());
        alarm.times_raised += 1;
        log::info!("Alarm raised by {}", source);
    }

    pub fn clear_alarm(&self) {
        let mut alarm = self.alarm.write();
        if alarm.raised {
            log::info!("Alarm cleared");
        }
        alarm.raised = false;
        alarm.source = None;
    }

    pub fn is_alarm_raised(&self) -> bool {
        self.alarm.read().raised
    }

    /// Who raised the active alarm
    pub fn alarm_source(&self) -> Option<String> {
        self.alarm.read().source.clone()
    }

    /// How many distinct alarms have been raised
    pub fn times_raised(&self) -> u32 {
        self.alarm.read().times_raised
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alarm_lifecycle() {
        let services = WorldServices::shared();
        assert!(!services.is_alarm_raised());

        services.raise_alarm("camera-1");
        services.raise_alarm("guard-2");
        assert!(services.is_alarm_raised());
        assert_eq!(services.alarm_source().as_deref(), Some("camera-1"));
        assert_eq!(services.times_raised(), 1);

        services.clear_alarm();
        assert!(!services.is_alarm_raised());
        assert!(services.alarm_source().is_none());
    }
}
