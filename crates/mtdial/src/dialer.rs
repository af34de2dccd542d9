//! The modem dialer.
//!
//! Two machines run stacked: `ModemState` tracks the AT command
//! exchange with the local modem, `DialState` tracks the outer redial
//! cycle across tagged phonebook entries. Bytes from the modem feed
//! [`Dialer::feed_byte`]; the wall clock drives [`Dialer::tick`].

use tracing::{debug, info};

use mtbook::PhonebookEntry;

use crate::baud::nearest_dte_rate;

/// Seconds a dial attempt may wait for CONNECT.
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 60;
/// Seconds between redial attempts.
pub const DEFAULT_BETWEEN_PAUSE: u64 = 5;
/// Seconds the CYCLE banner shows before the between-dial pause.
const CYCLE_HOLD: u64 = 1;
/// Seconds a manual cycle / kill / abort banner shows.
const SHORT_HOLD: u64 = 1;
/// Seconds the CONNECTED banner shows before the console takes over.
const CONNECTED_HOLD: u64 = 3;
/// Seconds the "no numbers left" banner shows.
const NO_NUMBERS_HOLD: u64 = 5;
/// Seconds added per press of the extend key.
const EXTEND_SECONDS: u64 = 10;

/// The AT exchange with the local modem.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ModemState {
    #[default]
    Init,
    SentAt,
    SentDialString,
    Connected,
}

/// The outer redial cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DialState {
    #[default]
    Dialing,
    Cycle,
    BetweenPause,
    LineBusy,
    ManualCycle,
    Killed,
    Connected,
    UserAborted,
    NoNumbersLeft,
}

/// Events surfaced while consuming modem bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialerEvent {
    /// Carrier is up. When the entry does not lock the DTE rate and
    /// the modem reported a speed, `new_dte_baud` carries the rate the
    /// local UART should be reconfigured to.
    Connected {
        dce_baud: Option<u32>,
        new_dte_baud: Option<u32>,
    },
    /// The modem reported a failed attempt (BUSY, NO CARRIER, ...).
    LineBusy,
    /// A byte received after CONNECT; it belongs to the remote peer
    /// and must go through the emulator pipeline untouched.
    Passthrough(u8),
}

/// What the caller should do after a clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAction {
    None,
    /// Pick the next tagged entry and start a fresh dial.
    AdvanceAndRedial,
    /// Hand the connection to the console emulator.
    HandOffToConsole,
    /// The cycle is over; back to the phonebook display.
    ReturnToPhonebook,
}

/// Dialer tunables (the global dial options).
#[derive(Debug, Clone)]
pub struct DialerConfig {
    /// Command prefix the phone number is appended to.
    pub dial_string: String,
    pub connect_timeout: u64,
    pub between_pause: u64,
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            dial_string: "ATDT".to_owned(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            between_pause: DEFAULT_BETWEEN_PAUSE,
        }
    }
}

/// The dialer. One exists only while dialing; on hand-off it is
/// dropped and the framer's byte stream goes to the emulator.
#[derive(Debug)]
pub struct Dialer {
    config: DialerConfig,
    modem_state: ModemState,
    dial_state: DialState,
    cycle_start_time: u64,
    /// Extra seconds granted by the extend key.
    extension: u64,
    reply_line: Vec<u8>,
    /// Last command sent, for modem echo suppression.
    sent_command: String,
    address: String,
    lock_dte_baud: bool,
    dce_baud: Option<u32>,
    attempts: u32,
}

impl Dialer {
    #[must_use]
    pub fn new(config: DialerConfig) -> Self {
        Self {
            config,
            modem_state: ModemState::Init,
            dial_state: DialState::Dialing,
            cycle_start_time: 0,
            extension: 0,
            reply_line: Vec::new(),
            sent_command: String::new(),
            address: String::new(),
            lock_dte_baud: false,
            dce_baud: None,
            attempts: 0,
        }
    }

    #[must_use]
    pub fn modem_state(&self) -> ModemState {
        self.modem_state
    }

    #[must_use]
    pub fn dial_state(&self) -> DialState {
        self.dial_state
    }

    #[must_use]
    pub fn dce_baud(&self) -> Option<u32> {
        self.dce_baud
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn cycle_start_time(&self) -> u64 {
        self.cycle_start_time
    }

    /// Begin (or re-begin) dialing `entry`.
    ///
    /// Once the cycle has reached `Connected`, this is a no-op until
    /// [`Dialer::close`]; carrier is never silently dropped.
    pub fn start_dial(&mut self, entry: &PhonebookEntry, now: u64, modem_out: &mut Vec<u8>) {
        if self.dial_state == DialState::Connected {
            return;
        }
        info!(name = %entry.name, address = %entry.address, "dialing");
        self.address = entry.address.clone();
        self.lock_dte_baud = entry.serial.lock_dte_baud;
        self.dce_baud = None;
        self.reply_line.clear();
        self.extension = 0;
        self.attempts += 1;
        self.cycle_start_time = now;
        self.dial_state = DialState::Dialing;
        self.send_command("AT", modem_out);
        self.modem_state = ModemState::SentAt;
    }

    /// Drop the line and reset both machines.
    pub fn close(&mut self) {
        self.modem_state = ModemState::Init;
        self.dial_state = DialState::Dialing;
        self.reply_line.clear();
        self.dce_baud = None;
    }

    fn send_command(&mut self, command: &str, modem_out: &mut Vec<u8>) {
        debug!(command, "modem command");
        self.sent_command = command.to_owned();
        modem_out.extend_from_slice(command.as_bytes());
        modem_out.push(b'\r');
    }

    // ----- modem bytes -----

    /// Consume one byte from the modem.
    pub fn feed_byte(
        &mut self,
        byte: u8,
        now: u64,
        modem_out: &mut Vec<u8>,
    ) -> Option<DialerEvent> {
        if self.modem_state == ModemState::Connected {
            return Some(DialerEvent::Passthrough(byte));
        }
        match byte {
            b'\r' => {
                let line = String::from_utf8_lossy(&self.reply_line).trim().to_owned();
                self.reply_line.clear();
                if line.is_empty() {
                    None
                } else {
                    self.handle_reply(&line, now, modem_out)
                }
            }
            b'\n' => None,
            _ => {
                self.reply_line.push(byte);
                None
            }
        }
    }

    fn handle_reply(
        &mut self,
        line: &str,
        now: u64,
        modem_out: &mut Vec<u8>,
    ) -> Option<DialerEvent> {
        debug!(line, state = ?self.modem_state, "modem reply");
        match self.modem_state {
            ModemState::Init | ModemState::Connected => None,
            ModemState::SentAt => {
                if line == self.sent_command {
                    // Command echo.
                    return None;
                }
                if line == "OK" {
                    let command = format!("{}{}", self.config.dial_string, self.address);
                    self.send_command(&command, modem_out);
                } // Anything else: fall through and let the cycle retry.
                self.modem_state = ModemState::SentDialString;
                None
            }
            ModemState::SentDialString => {
                if line == self.sent_command {
                    return None;
                }
                if matches!(line, "NO DIALTONE" | "BUSY" | "NO CARRIER" | "VOICE") {
                    info!(line, "dial attempt failed");
                    self.dial_state = DialState::LineBusy;
                    self.cycle_start_time = now;
                    return Some(DialerEvent::LineBusy);
                }
                if let Some(rest) = line.strip_prefix("CONNECT") {
                    let dce_baud = atoi_simd::parse::<u32>(rest.trim().as_bytes()).ok();
                    info!(?dce_baud, "carrier up");
                    self.dce_baud = dce_baud;
                    self.modem_state = ModemState::Connected;
                    self.dial_state = DialState::Connected;
                    self.cycle_start_time = now;
                    let new_dte_baud = match (self.lock_dte_baud, dce_baud) {
                        (false, Some(baud)) => Some(nearest_dte_rate(baud)),
                        _ => None,
                    };
                    return Some(DialerEvent::Connected {
                        dce_baud,
                        new_dte_baud,
                    });
                }
                // RINGING and friends.
                None
            }
        }
    }

    // ----- wall clock -----

    /// Check timers. Call once per main-loop iteration.
    pub fn tick(&mut self, now: u64) -> TickAction {
        let elapsed = now.saturating_sub(self.cycle_start_time);
        match self.dial_state {
            DialState::Dialing => {
                if elapsed >= self.config.connect_timeout + self.extension {
                    debug!("dial attempt timed out");
                    self.dial_state = DialState::Cycle;
                    self.cycle_start_time = now;
                }
                TickAction::None
            }
            DialState::Cycle => {
                if elapsed >= CYCLE_HOLD {
                    self.dial_state = DialState::BetweenPause;
                    self.cycle_start_time = now;
                }
                TickAction::None
            }
            DialState::BetweenPause => {
                if elapsed >= self.config.between_pause {
                    TickAction::AdvanceAndRedial
                } else {
                    TickAction::None
                }
            }
            DialState::LineBusy => {
                if elapsed >= self.config.between_pause {
                    TickAction::AdvanceAndRedial
                } else {
                    TickAction::None
                }
            }
            DialState::ManualCycle | DialState::Killed => {
                if elapsed >= SHORT_HOLD {
                    TickAction::AdvanceAndRedial
                } else {
                    TickAction::None
                }
            }
            DialState::Connected => {
                if elapsed >= CONNECTED_HOLD {
                    TickAction::HandOffToConsole
                } else {
                    TickAction::None
                }
            }
            DialState::UserAborted => {
                if elapsed >= SHORT_HOLD {
                    TickAction::ReturnToPhonebook
                } else {
                    TickAction::None
                }
            }
            DialState::NoNumbersLeft => {
                if elapsed >= NO_NUMBERS_HOLD {
                    TickAction::ReturnToPhonebook
                } else {
                    TickAction::None
                }
            }
        }
    }

    // ----- user keys -----

    /// `X`: grant the current attempt ten more seconds.
    pub fn extend_timeout(&mut self) {
        if self.dial_state == DialState::Dialing {
            self.extension += EXTEND_SECONDS;
        }
    }

    /// `C`: give up on this attempt and cycle immediately.
    pub fn manual_cycle(&mut self, now: u64) {
        if self.dial_state == DialState::Dialing {
            self.dial_state = DialState::ManualCycle;
            self.cycle_start_time = now;
        }
    }

    /// `K`: the caller untags the entry; the dialer shows the kill
    /// banner and cycles (or gives up when nothing is left tagged).
    pub fn kill_current(&mut self, remaining_tagged: usize, now: u64) {
        self.cycle_start_time = now;
        self.dial_state = if remaining_tagged == 0 {
            DialState::NoNumbersLeft
        } else {
            DialState::Killed
        };
    }

    /// ESC/backtick: abort the whole cycle.
    pub fn abort(&mut self, now: u64) {
        self.dial_state = DialState::UserAborted;
        self.cycle_start_time = now;
    }

    /// Any key during the CONNECTED banner skips the hold.
    pub fn skip_connected_hold(&mut self) -> bool {
        self.dial_state == DialState::Connected
    }
}
