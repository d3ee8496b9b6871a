use clap::{builder::ValueParser, Arg, ArgAction, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

/// Level names in verbosity order; the index is the `-v` count.
pub const LEVEL_NAMES: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

const MAX_VERBOSITY: u8 = 5;

/// Turn `FACEGATE_LOG_LEVEL` into a verbosity count.
///
/// Accepts a level name (any case) or a count up to 5.
///
/// # Errors
/// Returns a message naming the accepted values.
pub fn parse_level(raw: &str) -> Result<u8, String> {
    let raw = raw.trim();

    if let Ok(count) = raw.parse::<u8>() {
        return if count <= MAX_VERBOSITY {
            Ok(count)
        } else {
            Err(format!("log level count must be at most {MAX_VERBOSITY}"))
        };
    }

    LEVEL_NAMES
        .iter()
        .position(|name| name.eq_ignore_ascii_case(raw))
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| format!("invalid log level, expected one of: {}", LEVEL_NAMES.join(", ")))
}

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(parse_level)
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity: repeat -v, or set FACEGATE_LOG_LEVEL to error|warn|info|debug|trace")
            .env("FACEGATE_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_map_to_their_position() {
        assert_eq!(parse_level("error"), Ok(0));
        assert_eq!(parse_level("WARN"), Ok(1));
        assert_eq!(parse_level(" Info "), Ok(2));
        assert_eq!(parse_level("trace"), Ok(4));
    }

    #[test]
    fn counts_are_capped() {
        assert_eq!(parse_level("3"), Ok(3));
        assert_eq!(parse_level("5"), Ok(5));
        assert!(parse_level("6").is_err());
    }

    #[test]
    fn unknown_level_lists_accepted_names() {
        assert!(parse_level("loud")
            .err()
            .is_some_and(|message| message.contains("error, warn, info, debug, trace")));
    }
}
