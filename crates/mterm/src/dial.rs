//! The dial phase.
//!
//! A [`DialCycle`] owns the dialer and the position in the tagged-entry
//! cycle. It exists only until carrier: on hand-off the caller builds a
//! [`crate::Session`] for the connected entry and drops the cycle, and
//! the modem's byte stream belongs to the emulator from then on.

use tracing::info;

use mtbook::Phonebook;
use mtdial::{DialState, Dialer, DialerConfig, DialerEvent, TickAction};

/// What the caller should do with the cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialOutcome {
    /// Keep pumping modem bytes and ticking.
    Continue,
    /// Carrier is up and the connect banner has elapsed; build a
    /// session for this entry and drop the cycle.
    HandOff {
        entry_index: usize,
        dce_baud: Option<u32>,
    },
    /// Reconfigure the local UART before continuing.
    SetDteBaud(u32),
    /// The cycle is over with no connection.
    Done,
}

/// The redial cycle over tagged entries.
#[derive(Debug)]
pub struct DialCycle {
    dialer: Dialer,
    current: usize,
}

impl DialCycle {
    /// Start dialing `start_index` (which need not be tagged; a direct
    /// dial of an untagged entry is fine).
    pub fn start(
        config: DialerConfig,
        phonebook: &Phonebook,
        start_index: usize,
        now: u64,
        modem_out: &mut Vec<u8>,
    ) -> Option<Self> {
        let entry = phonebook.entry(start_index)?;
        let mut dialer = Dialer::new(config);
        dialer.start_dial(entry, now, modem_out);
        Some(Self {
            dialer,
            current: start_index,
        })
    }

    #[must_use]
    pub fn dialer(&self) -> &Dialer {
        &self.dialer
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Feed one modem byte.
    pub fn on_modem_byte(
        &mut self,
        byte: u8,
        phonebook: &mut Phonebook,
        now: u64,
        modem_out: &mut Vec<u8>,
    ) -> DialOutcome {
        match self.dialer.feed_byte(byte, now, modem_out) {
            Some(DialerEvent::Connected {
                dce_baud: _,
                new_dte_baud,
            }) => {
                if let Some(entry) = phonebook.entry_mut(self.current) {
                    entry.note_connect(now);
                    info!(name = %entry.name, times_on = entry.times_on, "connected");
                }
                match new_dte_baud {
                    Some(rate) => DialOutcome::SetDteBaud(rate),
                    None => DialOutcome::Continue,
                }
            }
            Some(DialerEvent::LineBusy | DialerEvent::Passthrough(_)) | None => {
                DialOutcome::Continue
            }
        }
    }

    /// Advance timers; call once per main-loop iteration.
    pub fn on_tick(
        &mut self,
        phonebook: &mut Phonebook,
        now: u64,
        modem_out: &mut Vec<u8>,
    ) -> DialOutcome {
        match self.dialer.tick(now) {
            TickAction::None => DialOutcome::Continue,
            TickAction::AdvanceAndRedial => {
                match phonebook.next_tagged(self.current) {
                    Some(next) => {
                        self.current = next;
                        if let Some(entry) = phonebook.entry(next) {
                            self.dialer.start_dial(entry, now, modem_out);
                        }
                        DialOutcome::Continue
                    }
                    None => DialOutcome::Done,
                }
            }
            TickAction::HandOffToConsole => DialOutcome::HandOff {
                entry_index: self.current,
                dce_baud: self.dialer.dce_baud(),
            },
            TickAction::ReturnToPhonebook => DialOutcome::Done,
        }
    }

    /// `K`: untag the current entry and cycle, or give up when it was
    /// the last tagged number.
    pub fn kill_current(&mut self, phonebook: &mut Phonebook, now: u64) {
        phonebook.untag(self.current);
        self.dialer.kill_current(phonebook.tagged_count(), now);
    }

    /// `X`: extend the current attempt.
    pub fn extend_timeout(&mut self) {
        self.dialer.extend_timeout();
    }

    /// `C`: cycle immediately.
    pub fn manual_cycle(&mut self, now: u64) {
        self.dialer.manual_cycle(now);
    }

    /// ESC/backtick: abort; the caller closes the transport.
    pub fn abort(&mut self, now: u64) {
        self.dialer.abort(now);
    }

    /// Any key during the connect banner jumps straight to hand-off.
    #[must_use]
    pub fn skip_connected_hold(&mut self) -> Option<DialOutcome> {
        if self.dialer.dial_state() == DialState::Connected {
            Some(DialOutcome::HandOff {
                entry_index: self.current,
                dce_baud: self.dialer.dce_baud(),
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mtbook::PhonebookEntry;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn phonebook(tagged: &[bool]) -> Phonebook {
        let mut book = Phonebook::empty(Path::new("/nonexistent"));
        for (i, &t) in tagged.iter().enumerate() {
            let mut entry = PhonebookEntry::new(&format!("bbs{i}"), &format!("555-010{i}"));
            entry.tagged = t;
            book.push(entry);
        }
        book
    }

    fn feed(
        cycle: &mut DialCycle,
        book: &mut Phonebook,
        line: &str,
        now: u64,
        out: &mut Vec<u8>,
    ) -> Vec<DialOutcome> {
        line.bytes()
            .map(|b| cycle.on_modem_byte(b, book, now, out))
            .filter(|o| *o != DialOutcome::Continue)
            .collect()
    }

    #[test]
    fn test_connect_records_stats_and_hands_off() {
        let mut book = phonebook(&[true]);
        let mut out = Vec::new();
        let mut cycle =
            DialCycle::start(DialerConfig::default(), &book, 0, 100, &mut out).unwrap();
        assert_eq!(out, b"AT\r");

        out.clear();
        feed(&mut cycle, &mut book, "OK\r", 101, &mut out);
        let outcomes = feed(&mut cycle, &mut book, "CONNECT 19200\r", 102, &mut out);
        assert_eq!(outcomes, vec![DialOutcome::SetDteBaud(19_200)]);
        assert_eq!(book.entry(0).unwrap().times_on, 1);
        assert_eq!(book.entry(0).unwrap().last_call, 102);

        // Banner holds three seconds, then the console takes over.
        assert_eq!(cycle.on_tick(&mut book, 103, &mut out), DialOutcome::Continue);
        assert_eq!(
            cycle.on_tick(&mut book, 105, &mut out),
            DialOutcome::HandOff {
                entry_index: 0,
                dce_baud: Some(19_200)
            }
        );
    }

    #[test]
    fn test_busy_advances_to_next_tagged() {
        let mut book = phonebook(&[true, false, true]);
        let mut out = Vec::new();
        let mut cycle =
            DialCycle::start(DialerConfig::default(), &book, 0, 100, &mut out).unwrap();
        feed(&mut cycle, &mut book, "OK\rBUSY\r", 101, &mut out);
        assert_eq!(cycle.dialer().dial_state(), DialState::LineBusy);

        out.clear();
        // After the between-dial pause the cycle moves to entry 2,
        // skipping the untagged entry 1.
        assert_eq!(
            cycle.on_tick(&mut book, 106, &mut out),
            DialOutcome::Continue
        );
        assert_eq!(cycle.current_index(), 2);
        assert_eq!(out, b"AT\r");
        assert_eq!(cycle.dialer().dial_state(), DialState::Dialing);
        assert_eq!(cycle.dialer().attempts(), 2);
    }

    #[test]
    fn test_kill_last_number_finishes_cycle() {
        let mut book = phonebook(&[true]);
        let mut out = Vec::new();
        let mut cycle =
            DialCycle::start(DialerConfig::default(), &book, 0, 0, &mut out).unwrap();
        cycle.kill_current(&mut book, 5);
        assert_eq!(book.tagged_count(), 0);
        assert_eq!(cycle.dialer().dial_state(), DialState::NoNumbersLeft);
        assert_eq!(cycle.on_tick(&mut book, 20, &mut out), DialOutcome::Done);
    }

    #[test]
    fn test_abort_returns_to_phonebook() {
        let mut book = phonebook(&[true, true]);
        let mut out = Vec::new();
        let mut cycle =
            DialCycle::start(DialerConfig::default(), &book, 0, 0, &mut out).unwrap();
        cycle.abort(1);
        assert_eq!(cycle.on_tick(&mut book, 3, &mut out), DialOutcome::Done);
    }

    #[test]
    fn test_single_tagged_entry_redials_itself() {
        let mut book = phonebook(&[false, true]);
        let mut out = Vec::new();
        let mut cycle =
            DialCycle::start(DialerConfig::default(), &book, 1, 0, &mut out).unwrap();
        feed(&mut cycle, &mut book, "OK\rNO CARRIER\r", 1, &mut out);
        out.clear();
        assert_eq!(
            cycle.on_tick(&mut book, 10, &mut out),
            DialOutcome::Continue
        );
        assert_eq!(cycle.current_index(), 1);
        assert_eq!(out, b"AT\r");
    }
}
