use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

const CAPACITY: usize = 10;

#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub unix_secs: u64,
    pub message: String,
}

/// A bounded ring of the last 10 error events (§4.6 `errors` command),
/// newest first. Decode/orphan/bind failures push here in addition to
/// being logged, so an operator attached to the stats port can see recent
/// trouble without grepping logs.
pub struct ErrorLog {
    events: Mutex<VecDeque<ErrorEvent>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        ErrorLog {
            events: Mutex::new(VecDeque::with_capacity(CAPACITY)),
        }
    }

    pub fn push(&self, message: impl Into<String>) {
        let unix_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let mut events = self.events.lock().unwrap();
        if events.len() == CAPACITY {
            events.pop_back();
        }
        events.push_front(ErrorEvent {
            unix_secs,
            message: message.into(),
        });
    }

    pub fn recent(&self) -> Vec<ErrorEvent> {
        self.events.lock().unwrap().iter().cloned().collect()
    }
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn keeps_only_the_last_ten_events_newest_first() {
        let log = ErrorLog::new();
        for i in 0..15 {
            log.push(format!("error {}", i));
        }
        let recent = log.recent();
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].message, "error 14");
        assert_eq!(recent[9].message, "error 5");
    }
}
