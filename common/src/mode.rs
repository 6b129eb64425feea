use chrono::{DateTime, FixedOffset};

use crate::{override_window::OverrideWindow, types::Mode};

/// Published `auto`/`heat` view of whether a manual override is in force.
///
/// External commands move the mode and reshape the override window; the
/// per-tick [`ModeMachine::sync`] then keeps the mode consistent with the
/// window and has the final word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeMachine {
    mode: Mode,
}

impl ModeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Applies an external mode command. Returns the new mode when it changed.
    ///
    /// Unknown tokens and commands equal to the current mode are ignored.
    pub fn command(
        &mut self,
        raw: &str,
        now: DateTime<FixedOffset>,
        window: &mut OverrideWindow,
    ) -> Option<Mode> {
        let requested = raw.parse::<Mode>().ok()?;
        if requested == self.mode {
            return None;
        }

        match requested {
            Mode::Heat => {
                window.extend(now);
            }
            Mode::Auto => window.collapse(now),
        }
        self.mode = requested;
        Some(requested)
    }

    /// Forces the mode from the override window state. Returns the new mode
    /// when it changed.
    pub fn sync(&mut self, override_active: bool) -> Option<Mode> {
        let forced = if override_active {
            Mode::Heat
        } else {
            Mode::Auto
        };

        if forced == self.mode {
            return None;
        }
        self.mode = forced;
        Some(forced)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(hour: u32, minute: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 10, hour, minute, 0)
            .unwrap()
    }

    fn window() -> OverrideWindow {
        OverrideWindow::new(at(9, 0), Duration::minutes(60))
    }

    #[test]
    fn starts_in_auto() {
        assert_eq!(ModeMachine::new().mode(), Mode::Auto);
    }

    #[test]
    fn unknown_commands_are_ignored() {
        let mut machine = ModeMachine::new();
        let mut window = window();

        for raw in ["cool", "HEAT", "", "heat\n", "off"] {
            assert_eq!(machine.command(raw, at(9, 0), &mut window), None);
        }
        assert_eq!(machine.mode(), Mode::Auto);
        assert!(!window.is_active(at(9, 0)));
    }

    #[test]
    fn heat_extends_override_window() {
        let mut machine = ModeMachine::new();
        let mut window = window();

        assert_eq!(machine.command("heat", at(9, 10), &mut window), Some(Mode::Heat));
        assert_eq!(machine.mode(), Mode::Heat);
        assert_eq!(window.expires_at(), at(10, 10));
    }

    #[test]
    fn repeated_command_is_not_a_change() {
        let mut machine = ModeMachine::new();
        let mut window = window();

        assert_eq!(machine.command("heat", at(9, 10), &mut window), Some(Mode::Heat));
        assert_eq!(machine.command("heat", at(9, 20), &mut window), None);
        // The ignored repeat leaves the window where the first command put it.
        assert_eq!(window.expires_at(), at(10, 10));

        assert_eq!(machine.command("auto", at(9, 30), &mut window), Some(Mode::Auto));
        assert_eq!(machine.command("auto", at(9, 31), &mut window), None);
    }

    #[test]
    fn auto_collapses_override_window() {
        let mut machine = ModeMachine::new();
        let mut window = window();
        machine.command("heat", at(9, 0), &mut window);

        assert_eq!(machine.command("auto", at(9, 30), &mut window), Some(Mode::Auto));
        assert!(!window.is_active(at(9, 30)));
        assert_eq!(window.expires_at(), at(9, 30));
    }

    #[test]
    fn sync_follows_override_state() {
        let mut machine = ModeMachine::new();

        assert_eq!(machine.sync(false), None);
        assert_eq!(machine.sync(true), Some(Mode::Heat));
        assert_eq!(machine.sync(true), None);
        assert_eq!(machine.sync(false), Some(Mode::Auto));
        assert_eq!(machine.mode(), Mode::Auto);
    }
}
