//! Event kind selection for tokenized status lines.
//!
//! Classification only decides which decoder gets the line; it never
//! rejects anything. Block reports take precedence over train reports.

use serde::Deserialize;

/// Keyword that opens a block occupancy report.
pub const BLOCK_KEYWORD: &str = "BLOCK";
/// Keyword that opens a train direction report.
pub const TRAIN_KEYWORD: &str = "TRAIN";
/// Keyword that must accompany [`TRAIN_KEYWORD`].
pub const STATUS_KEYWORD: &str = "STATUS";

/// How strictly lines are matched against the message grammar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// Keywords must sit at their token positions and state keywords must
    /// match exactly.
    #[default]
    Strict,
    /// Keywords are found anywhere in the line and state keywords by
    /// substring, as older field controller firmware expects. A direction
    /// or noise token that happens to contain a keyword can misclassify.
    Compatible,
}

/// Which decoder a line is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// `BLOCK <id> <state> ...`
    BlockState,
    /// `TRAIN <track> STATUS <direction> ...`, both keywords required.
    TrainStatus,
    /// Anything else.
    Unrecognized,
}

/// Pick the event kind for a line. First match wins.
pub fn classify(line: &str, tokens: &[&str], mode: ParseMode) -> EventKind {
    match mode {
        ParseMode::Strict => match tokens {
            [BLOCK_KEYWORD, ..] => EventKind::BlockState,
            [TRAIN_KEYWORD, _, STATUS_KEYWORD, ..] => EventKind::TrainStatus,
            _ => EventKind::Unrecognized,
        },
        ParseMode::Compatible => {
            // The controller always follows a keyword with a separator.
            if line.contains("BLOCK ") {
                EventKind::BlockState
            } else if line.contains("TRAIN ") && line.contains(STATUS_KEYWORD) {
                EventKind::TrainStatus
            } else {
                EventKind::Unrecognized
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenize::tokenize;

    fn kind(line: &str, mode: ParseMode) -> EventKind {
        classify(line, &tokenize(line), mode)
    }

    #[test]
    fn strict_uses_leading_keyword() {
        assert_eq!(kind("BLOCK 1 OFF", ParseMode::Strict), EventKind::BlockState);
        assert_eq!(
            kind("TRAIN 1 STATUS NORTH", ParseMode::Strict),
            EventKind::TrainStatus
        );
        assert_eq!(
            kind("noise BLOCK 1 OFF", ParseMode::Strict),
            EventKind::Unrecognized
        );
        assert_eq!(kind("PING", ParseMode::Strict), EventKind::Unrecognized);
        assert_eq!(kind("", ParseMode::Strict), EventKind::Unrecognized);
    }

    #[test]
    fn compatible_tolerates_leading_noise() {
        assert_eq!(
            kind(">> BLOCK 1 OFF", ParseMode::Compatible),
            EventKind::BlockState
        );
        assert_eq!(
            kind("# TRAIN 2 STATUS WEST", ParseMode::Compatible),
            EventKind::TrainStatus
        );
    }

    #[test]
    fn train_needs_status_keyword() {
        for mode in [ParseMode::Strict, ParseMode::Compatible] {
            assert_eq!(kind("TRAIN 2 SPEED 40", mode), EventKind::Unrecognized);
        }
        // Strict also wants STATUS in its slot.
        assert_eq!(
            kind("TRAIN 2 40 STATUS", ParseMode::Strict),
            EventKind::Unrecognized
        );
        assert_eq!(
            kind("TRAIN 2 STATUS", ParseMode::Strict),
            EventKind::TrainStatus
        );
    }

    #[test]
    fn block_takes_precedence_over_train() {
        let line = "TRAIN 1 STATUS BLOCK 2";
        assert_eq!(kind(line, ParseMode::Compatible), EventKind::BlockState);
        assert_eq!(kind(line, ParseMode::Strict), EventKind::TrainStatus);
    }

    #[test]
    fn parse_mode_from_yaml() {
        let mode: Result<ParseMode, _> = serde_yml::from_str("compatible");
        assert_eq!(mode.ok(), Some(ParseMode::Compatible));
        assert_eq!(ParseMode::default(), ParseMode::Strict);
    }
}
