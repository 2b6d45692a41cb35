//! Segmenting instruction text into its structural blocks.
//!
//! Slicer output has a fixed layout:
//!
//! ```text
//! preamble           anything before the header
//! ; HEADER_BLOCK_START
//! ...                metadata comments
//! ; HEADER_BLOCK_END
//! ; CONFIG_BLOCK_START
//! ...                slicer settings
//! ; CONFIG_BLOCK_END
//! body               machine start code, layers, end code
//! ```
//!
//! Only the body is repeated when looping. The four spans are slices of the
//! original text, so nothing is copied unless the body needs filtering.

use std::borrow::Cow;

use super::markers::{self, BlockMarker};
use crate::text::{self, LineEnding};
use crate::{Error, Result};

/// Instruction text split into preamble, header, config and body.
///
/// The spans are contiguous: `preamble + header + config + body`
/// reproduces the input exactly unless a trailer comment was filtered out
/// of the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionDocument<'a> {
    text: &'a str,
    header_start: usize,
    config_start: usize,
    body_start: usize,
    body: Cow<'a, str>,
    line_ending: LineEnding,
}

impl<'a> InstructionDocument<'a> {
    /// Text before the header-start line.
    pub fn preamble(&self) -> &'a str {
        &self.text[..self.header_start]
    }

    /// From the header-start line up to the config-start line.
    pub fn header(&self) -> &'a str {
        &self.text[self.header_start..self.config_start]
    }

    /// From the config-start line through the config-end line.
    pub fn config(&self) -> &'a str {
        &self.text[self.config_start..self.body_start]
    }

    /// `preamble + header + config`, emitted once in looped output.
    pub fn prefix(&self) -> &'a str {
        &self.text[..self.body_start]
    }

    /// Everything after the config-end line.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Body lines without terminators.
    pub fn body_lines(&self) -> Vec<&str> {
        text::lines(&self.body)
    }

    /// Returns `true` if a trailer comment was dropped from the body.
    pub fn body_filtered(&self) -> bool {
        matches!(self.body, Cow::Owned(_))
    }

    /// Line ending of the source text.
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Concatenates the four spans.
    pub fn concat(&self) -> String {
        let mut out = String::with_capacity(self.body_start + self.body.len());
        out.push_str(self.prefix());
        out.push_str(&self.body);
        out
    }
}

/// Splits `text` on the header/config block markers.
///
/// Markers are matched on trimmed lines and must appear in the order
/// header-start, header-end, config-start, config-end. Lines that look
/// like a later marker before an earlier one has been seen are ignored.
///
/// # Errors
///
/// Returns [`Error::MissingMarkers`] naming the first marker not found.
///
/// # Example
///
/// ```rust
/// use plateloop::gcode::split_blocks;
///
/// let text = "; HEADER_BLOCK_START\n; HEADER_BLOCK_END\n\
///             ; CONFIG_BLOCK_START\n; CONFIG_BLOCK_END\nG28\n";
/// let doc = split_blocks(text)?;
/// assert_eq!(doc.body(), "G28\n");
/// assert_eq!(doc.concat(), text);
/// # Ok::<(), plateloop::Error>(())
/// ```
pub fn split_blocks(text: &str) -> Result<InstructionDocument<'_>> {
    // Byte offsets: line start for the openings, line end for config-end.
    let mut found = [0usize; 4];
    let mut next = 0;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        if next < found.len() && BlockMarker::ORDER[next].matches(line) {
            found[next] = if next == 3 { offset + line.len() } else { offset };
            next += 1;
        }
        offset += line.len();
    }

    if let Some(missing) = BlockMarker::ORDER.get(next) {
        return Err(Error::MissingMarkers {
            marker: missing.name(),
        });
    }
    let [header_start, _header_end, config_start, body_start] = found;

    let body = filter_trailers(&text[body_start..]);
    if matches!(body, Cow::Owned(_)) {
        log::debug!("dropped trailer comment from instruction body");
    }

    Ok(InstructionDocument {
        text,
        header_start,
        config_start,
        body_start,
        body,
        line_ending: LineEnding::detect(text),
    })
}

fn filter_trailers(body: &str) -> Cow<'_, str> {
    if !body.split_inclusive('\n').any(markers::is_end_note) {
        return Cow::Borrowed(body);
    }
    Cow::Owned(
        body.split_inclusive('\n')
            .filter(|line| !markers::is_end_note(line))
            .collect(),
    )
}

/// Text bisected on the start-of-print and end-of-print markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintRegion<'a> {
    /// Everything before `;START gcode`.
    pub head: &'a str,
    /// From `;START gcode` up to `;END gcode`.
    pub piece: &'a str,
    /// From `;END gcode` to the end, or a synthesized end marker.
    pub tail: Cow<'a, str>,
}

/// Tail appended when a start marker has no matching end marker.
pub const SYNTHESIZED_TAIL: &str = "\n;END gcode (added by tool)";

impl PrintRegion<'_> {
    /// Returns `true` if the tail was synthesized.
    pub fn tail_synthesized(&self) -> bool {
        matches!(self.tail, Cow::Owned(_))
    }

    /// Concatenates head, piece and tail.
    pub fn concat(&self) -> String {
        [self.head, self.piece, &self.tail].concat()
    }
}

/// Splits text on `;START gcode` / `;END gcode` without requiring the block
/// markers.
///
/// Never fails:
/// - without a start marker the whole text is `piece`
/// - without an end marker after the start, `piece` runs to the end and
///   `tail` is [`SYNTHESIZED_TAIL`]
pub fn split_print_region(text: &str) -> PrintRegion<'_> {
    let Some(start) = markers::START_PRINT.find(text).map(|m| m.start()) else {
        return PrintRegion {
            head: "",
            piece: text,
            tail: Cow::Borrowed(""),
        };
    };

    match markers::END_PRINT.find_at(text, start).map(|m| m.start()) {
        Some(end) => PrintRegion {
            head: &text[..start],
            piece: &text[start..end],
            tail: Cow::Borrowed(&text[end..]),
        },
        None => {
            log::warn!("start-of-print marker without end marker; synthesizing tail");
            PrintRegion {
                head: &text[..start],
                piece: &text[start..],
                tail: Cow::Owned(SYNTHESIZED_TAIL.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "; preamble\n\
        ; HEADER_BLOCK_START\n\
        ; total layer number: 2\n\
        ; HEADER_BLOCK_END\n\
        \n\
        ; CONFIG_BLOCK_START\n\
        ; layer_height = 0.2\n\
        ; CONFIG_BLOCK_END\n\
        G28\n\
        ;LAYER:0\n\
        G1 X1 Y1 E1\n";

    #[test]
    fn test_split_spans() {
        let doc = split_blocks(SAMPLE).unwrap();
        assert_eq!(doc.preamble(), "; preamble\n");
        assert!(doc.header().starts_with("; HEADER_BLOCK_START\n"));
        assert!(doc.header().ends_with("; HEADER_BLOCK_END\n\n"));
        assert_eq!(
            doc.config(),
            "; CONFIG_BLOCK_START\n; layer_height = 0.2\n; CONFIG_BLOCK_END\n"
        );
        assert_eq!(doc.body(), "G28\n;LAYER:0\nG1 X1 Y1 E1\n");
        assert_eq!(doc.body_lines(), vec!["G28", ";LAYER:0", "G1 X1 Y1 E1"]);
        assert_eq!(doc.concat(), SAMPLE);
        assert_eq!(doc.line_ending(), LineEnding::Lf);
        assert!(!doc.body_filtered());
    }

    #[test]
    fn test_split_crlf_and_case() {
        let text = ";;header_block_start\r\n;header_block_end\r\n\
                    ; Config_Block_Start\r\n;  CONFIG_BLOCK_END\r\nG28\r\n";
        let doc = split_blocks(text).unwrap();
        assert_eq!(doc.line_ending(), LineEnding::CrLf);
        assert_eq!(doc.body(), "G28\r\n");
        assert_eq!(doc.concat(), text);
    }

    #[test]
    fn test_missing_markers() {
        let err = split_blocks("G28\n").unwrap_err();
        assert!(matches!(
            err,
            Error::MissingMarkers {
                marker: "HEADER_BLOCK_START"
            }
        ));

        let out_of_order = "; CONFIG_BLOCK_START\n; CONFIG_BLOCK_END\n\
                            ; HEADER_BLOCK_START\n; HEADER_BLOCK_END\n";
        let err = split_blocks(out_of_order).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingMarkers {
                marker: "CONFIG_BLOCK_START"
            }
        ));
    }

    #[test]
    fn test_trailer_is_filtered_from_body() {
        let text = "; HEADER_BLOCK_START\n; HEADER_BLOCK_END\n\
                    ; CONFIG_BLOCK_START\n; CONFIG_BLOCK_END\n\
                    G28\n;END gcode (added by tool)\nM400\n";
        let doc = split_blocks(text).unwrap();
        assert_eq!(doc.body(), "G28\nM400\n");
        assert!(doc.body_filtered());
    }

    #[test]
    fn test_config_end_on_last_line() {
        let text = "; HEADER_BLOCK_START\n; HEADER_BLOCK_END\n\
                    ; CONFIG_BLOCK_START\n; CONFIG_BLOCK_END";
        let doc = split_blocks(text).unwrap();
        assert_eq!(doc.body(), "");
        assert!(doc.body_lines().is_empty());
    }

    #[test]
    fn test_print_region() {
        let text = "; head\n;START gcode\nG28\n;END gcode\nM400\n";
        let region = split_print_region(text);
        assert_eq!(region.head, "; head\n");
        assert_eq!(region.piece, ";START gcode\nG28\n");
        assert_eq!(region.tail, ";END gcode\nM400\n");
        assert!(!region.tail_synthesized());
        assert_eq!(region.concat(), text);
    }

    #[test]
    fn test_print_region_fallbacks() {
        let region = split_print_region("G28\nG1 X1\n");
        assert_eq!(region.head, "");
        assert_eq!(region.piece, "G28\nG1 X1\n");
        assert_eq!(region.tail, "");

        let region = split_print_region("; head\n; start   GCODE\nG28\n");
        assert_eq!(region.head, "; head\n");
        assert_eq!(region.piece, "; start   GCODE\nG28\n");
        assert!(region.tail_synthesized());
        assert_eq!(region.tail, SYNTHESIZED_TAIL);
    }
}
