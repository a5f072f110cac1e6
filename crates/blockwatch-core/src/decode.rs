//! Typed event records decoded from classified status lines.
//!
//! Decoding is all-or-nothing: either every field validates and an
//! [`Event`] comes out, or a [`LineError`] does and nothing downstream
//! sees the line.

use blockwatch_types::{BlockId, OccupancyState, TrackId};

use crate::classify::{classify, EventKind, ParseMode, STATUS_KEYWORD};
use crate::error::LineError;
use crate::tokenize::tokenize;

/// Minimum token count for both message kinds.
pub const MIN_TOKENS: usize = 4;

/// Longest line, in bytes, the decoder accepts for either message kind.
///
/// Real reports are a few dozen bytes; anything near this is a framing
/// fault on the link.
pub const MAX_LINE_BYTES: usize = 512;

/// One decoded status message. Transient: never retained by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A block's current sensor changed state.
    BlockState {
        /// The block reported on.
        block_id: BlockId,
        /// Its reported occupancy.
        state: OccupancyState,
    },
    /// A track's train direction was reported.
    TrainStatus {
        /// The track number as sent, before any entity mapping.
        track_id: TrackId,
        /// The opaque direction token.
        direction: String,
    },
    /// A line matching no pattern, kept for diagnostics.
    Unrecognized {
        /// The line as received.
        raw_line: String,
    },
}

/// Tokenize, classify, and decode a raw line.
pub fn parse_line(line: &str, mode: ParseMode) -> Result<Event, LineError> {
    let tokens = tokenize(line);
    let kind = classify(line, &tokens, mode);
    if kind != EventKind::Unrecognized && line.len() > MAX_LINE_BYTES {
        return Err(LineError::malformed(
            kind,
            format!("line is {} bytes, limit is {MAX_LINE_BYTES}", line.len()),
        ));
    }
    decode(kind, line, &tokens, mode)
}

/// Decode the tokens of an already classified line.
pub fn decode(
    kind: EventKind,
    line: &str,
    tokens: &[&str],
    mode: ParseMode,
) -> Result<Event, LineError> {
    match kind {
        EventKind::BlockState => decode_block(tokens, mode),
        EventKind::TrainStatus => decode_train(tokens, mode),
        EventKind::Unrecognized => Ok(Event::Unrecognized {
            raw_line: line.to_owned(),
        }),
    }
}

/// `BLOCK <id> <state> [ignored...]`
fn decode_block(tokens: &[&str], mode: ParseMode) -> Result<Event, LineError> {
    let &[_, raw_id, keyword, _, ..] = tokens else {
        return Err(too_few_tokens(EventKind::BlockState, tokens.len()));
    };
    let block_id = BlockId::new(parse_id(EventKind::BlockState, "block id", raw_id)?);

    let state = match mode {
        ParseMode::Strict => OccupancyState::from_keyword(keyword),
        ParseMode::Compatible => OccupancyState::find_in(keyword),
    };

    state
        .map(|state| Event::BlockState { block_id, state })
        .ok_or_else(|| LineError::UnrecognizedKeyword {
            block_id,
            token: keyword.to_owned(),
        })
}

/// `TRAIN <track> STATUS <direction> [ignored...]`
fn decode_train(tokens: &[&str], mode: ParseMode) -> Result<Event, LineError> {
    let &[_, raw_track, status, direction, ..] = tokens else {
        return Err(too_few_tokens(EventKind::TrainStatus, tokens.len()));
    };
    let track_id = TrackId::new(parse_id(EventKind::TrainStatus, "track id", raw_track)?);

    // Strict classification only routes lines with STATUS here, but
    // `decode` is public and may be handed any kind.
    if mode == ParseMode::Strict && status != STATUS_KEYWORD {
        return Err(LineError::malformed(
            EventKind::TrainStatus,
            format!("expected {STATUS_KEYWORD} as third token, found {status:?}"),
        ));
    }

    Ok(Event::TrainStatus {
        track_id,
        direction: direction.to_owned(),
    })
}

/// Parse a non-negative id token.
fn parse_id(kind: EventKind, field: &str, raw: &str) -> Result<u32, LineError> {
    raw.parse::<u32>()
        .map_err(|e| LineError::malformed(kind, format!("invalid {field} {raw:?}: {e}")))
}

fn too_few_tokens(kind: EventKind, found: usize) -> LineError {
    LineError::malformed(
        kind,
        format!("expected at least {MIN_TOKENS} tokens, found {found}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict(line: &str) -> Result<Event, LineError> {
        parse_line(line, ParseMode::Strict)
    }

    fn compatible(line: &str) -> Result<Event, LineError> {
        parse_line(line, ParseMode::Compatible)
    }

    #[test]
    fn decode_block_standing() {
        assert_eq!(
            strict("BLOCK 12 STANDING 0.84A"),
            Ok(Event::BlockState {
                block_id: BlockId::new(12),
                state: OccupancyState::Standing,
            })
        );
    }

    #[test]
    fn block_needs_four_tokens() {
        // The fourth token carries the sensor reading and is ignored, but
        // the controller always sends it.
        let err = strict("BLOCK 7").err();
        assert!(matches!(
            err,
            Some(LineError::MalformedLine {
                kind: EventKind::BlockState,
                ..
            })
        ));
        assert!(strict("BLOCK 7 RUNNING").is_err());
        assert!(compatible("BLOCK 7 RUNNING").is_err());
    }

    #[test]
    fn negative_or_non_numeric_id_is_malformed() {
        for line in ["BLOCK -3 OFF x", "BLOCK three OFF x", "TRAIN -1 STATUS N x"] {
            assert!(
                matches!(strict(line), Err(LineError::MalformedLine { .. })),
                "{line}"
            );
            assert!(
                matches!(compatible(line), Err(LineError::MalformedLine { .. })),
                "{line}"
            );
        }
    }

    #[test]
    fn unknown_state_keyword_is_reported_with_block() {
        assert_eq!(
            strict("BLOCK 4 IDLE x"),
            Err(LineError::UnrecognizedKeyword {
                block_id: BlockId::new(4),
                token: String::from("IDLE"),
            })
        );
    }

    #[test]
    fn strict_keyword_must_match_exactly() {
        assert!(matches!(
            strict("BLOCK 4 RUNNING: x"),
            Err(LineError::UnrecognizedKeyword { .. })
        ));
        assert_eq!(
            compatible("BLOCK 4 RUNNING: x"),
            Ok(Event::BlockState {
                block_id: BlockId::new(4),
                state: OccupancyState::Running,
            })
        );
    }

    #[test]
    fn compatible_keyword_priority_is_off_standing_running() {
        assert_eq!(
            compatible("BLOCK 2 STANDING/OFF x"),
            Ok(Event::BlockState {
                block_id: BlockId::new(2),
                state: OccupancyState::Off,
            })
        );
    }

    #[test]
    fn decode_train_status() {
        assert_eq!(
            strict("TRAIN 1 STATUS NORTH"),
            Ok(Event::TrainStatus {
                track_id: TrackId::new(1),
                direction: String::from("NORTH"),
            })
        );
    }

    #[test]
    fn train_without_status_is_unclassified_in_both_modes() {
        for line in ["TRAIN 1 SPEED NORTH", "TRAIN 2 SPEED 40"] {
            let expected = Ok(Event::Unrecognized {
                raw_line: line.to_owned(),
            });
            assert_eq!(strict(line), expected, "{line}");
            assert_eq!(compatible(line), expected, "{line}");
        }
    }

    #[test]
    fn train_status_too_short_is_malformed() {
        assert!(matches!(
            strict("TRAIN 1 STATUS"),
            Err(LineError::MalformedLine {
                kind: EventKind::TrainStatus,
                ..
            })
        ));
    }

    #[test]
    fn oversized_report_is_malformed() {
        let line = format!("BLOCK 1 RUNNING {}", "A".repeat(MAX_LINE_BYTES));
        assert!(matches!(
            strict(&line),
            Err(LineError::MalformedLine {
                kind: EventKind::BlockState,
                ..
            })
        ));
        // Oversized noise stays noise.
        let noise = "~".repeat(1024);
        assert!(matches!(strict(&noise), Ok(Event::Unrecognized { .. })));
    }

    #[test]
    fn compatible_train_reads_positional_fields() {
        // STATUS may sit anywhere; fields are still read by position.
        assert_eq!(
            compatible("TRAIN 2 DIR SOUTH STATUS"),
            Ok(Event::TrainStatus {
                track_id: TrackId::new(2),
                direction: String::from("SOUTH"),
            })
        );
    }

    #[test]
    fn unrecognized_carries_raw_line() {
        assert_eq!(
            strict("PING 42"),
            Ok(Event::Unrecognized {
                raw_line: String::from("PING 42"),
            })
        );
    }
}
