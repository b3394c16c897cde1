//! Console command parsing

use rig_protocol::{Frequency, Mode};
use thiserror::Error;

/// One line typed at the console
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Tune the receive frequency
    Frequency(Frequency),
    /// Set the transmit frequency (0 = leave split)
    TxFrequency(Frequency),
    /// Set the operating mode
    Mode(Mode),
    /// Key or unkey
    Ptt(bool),
    /// Bring the rig online
    Online,
    /// Take the rig offline
    Offline,
    /// Open a session, optionally with another model
    Open(Option<String>),
    /// Close the session
    Close,
    /// Poll now and report
    Sync,
    /// Show cached state
    State,
    /// List rig models
    Models,
    /// Show help
    Help,
    /// Exit
    Quit,
}

/// Why a line could not be parsed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("invalid frequency '{0}'")]
    BadFrequency(String),

    #[error("unknown mode '{0}'")]
    BadMode(String),

    #[error("expected on or off, got '{0}'")]
    BadSwitch(String),
}

pub const HELP: &str = "\
commands:
  freq <hz|mhz>     tune receive frequency (7074000 or 7.074)
  tx <hz|mhz|off>   set transmit frequency, off leaves split
  mode <name>       set mode (USB, LSB, CW, DATA-U, ...)
  ptt on|off        key or unkey
  online | offline  bring the rig online or take it offline
  open [model]      open a session
  close             close the session
  sync              poll the rig now
  state             show cached state
  models            list rig models
  quit              exit";

/// Parse a frequency in Hz, or in MHz if it has a decimal point
pub fn parse_frequency(text: &str) -> Result<Frequency, ParseError> {
    let bad = || ParseError::BadFrequency(text.to_string());
    if text.contains('.') {
        let mhz: f64 = text.parse().map_err(|_| bad())?;
        if !mhz.is_finite() || mhz < 0.0 {
            return Err(bad());
        }
        Ok((mhz * 1_000_000.0).round() as Frequency)
    } else {
        text.parse().map_err(|_| bad())
    }
}

fn parse_switch(text: &str) -> Result<bool, ParseError> {
    match text.to_ascii_lowercase().as_str() {
        "on" | "1" | "true" | "tx" => Ok(true),
        "off" | "0" | "false" | "rx" => Ok(false),
        _ => Err(ParseError::BadSwitch(text.to_string())),
    }
}

/// Parse a console line; blank lines give `None`
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Ok(None);
    };
    let arg = words.next();

    let command = match word.to_ascii_lowercase().as_str() {
        "freq" | "f" => {
            let arg = arg.ok_or(ParseError::MissingArgument("freq"))?;
            Command::Frequency(parse_frequency(arg)?)
        }
        "tx" => {
            let arg = arg.ok_or(ParseError::MissingArgument("tx"))?;
            if arg.eq_ignore_ascii_case("off") {
                Command::TxFrequency(0)
            } else {
                Command::TxFrequency(parse_frequency(arg)?)
            }
        }
        "mode" | "m" => {
            let arg = arg.ok_or(ParseError::MissingArgument("mode"))?;
            let mode = Mode::from_name(arg).ok_or_else(|| ParseError::BadMode(arg.to_string()))?;
            Command::Mode(mode)
        }
        "ptt" => {
            let arg = arg.ok_or(ParseError::MissingArgument("ptt"))?;
            Command::Ptt(parse_switch(arg)?)
        }
        "online" => Command::Online,
        "offline" => Command::Offline,
        "open" => Command::Open(arg.map(str::to_string)),
        "close" => Command::Close,
        "sync" => Command::Sync,
        "state" | "s" => Command::State,
        "models" => Command::Models,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}
