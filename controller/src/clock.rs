use chrono::{DateTime, FixedOffset, Local, Offset, Utc};
use chrono_tz::Tz;

/// Wall clock in the configured zone, or the system zone when none is set.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    timezone: Option<Tz>,
}

impl Clock {
    pub fn new(timezone: Option<Tz>) -> Self {
        Self { timezone }
    }

    pub fn now(&self) -> DateTime<FixedOffset> {
        match self.timezone {
            Some(tz) => {
                let local = Utc::now().with_timezone(&tz);
                local.with_timezone(&local.offset().fix())
            }
            None => {
                let local = Local::now();
                local.with_timezone(&local.offset().fix())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_configured_offset() {
        let clock = Clock::new(Some(chrono_tz::Asia::Kolkata));

        assert_eq!(clock.now().offset().local_minus_utc(), 5 * 3600 + 1800);
    }
}
