//! Minimal archive construction for bare G-code.

use crate::edit::paths::instruction_path;
use crate::text::LineEnding;

use super::{EntryInput, write_archive};

/// Path of the OPC content types part.
pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";

/// Content types declaring `.gcode` parts as plain text.
pub const CONTENT_TYPES_XML: &str = concat!(
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
    "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\n",
    "  <Default Extension=\"gcode\" ContentType=\"text/plain\"/>\n",
    "</Types>",
);

/// Wraps bare G-code into a two-entry stored archive.
///
/// The G-code lands at `Metadata/plate_<n>.gcode` (`n` clamped to at least
/// 1). Text without any carriage return is converted to CRLF; text that
/// already contains one is stored unchanged.
///
/// # Example
///
/// ```rust
/// use plateloop::read::{extract_entry, list_entries};
/// use plateloop::write::minimal_archive;
///
/// let bytes = minimal_archive(2, b"G28\nG1 X10\n");
/// let entries = list_entries(&bytes).unwrap();
/// assert_eq!(entries[0].name, "Metadata/plate_2.gcode");
/// assert_eq!(extract_entry(&bytes, &entries[0]).unwrap(), b"G28\r\nG1 X10\r\n");
/// ```
pub fn minimal_archive(plate_index: u32, gcode: &[u8]) -> Vec<u8> {
    let name = instruction_path(plate_index);
    let body = if gcode.contains(&b'\r') {
        gcode.to_vec()
    } else {
        LineEnding::CrLf.normalize_bytes(gcode)
    };

    write_archive(&[
        EntryInput::stored(&name, body),
        EntryInput::stored(CONTENT_TYPES_PATH, CONTENT_TYPES_XML.as_bytes()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read::{Archive, read_entry_payload};

    #[test]
    fn test_minimal_archive_layout() {
        let bytes = minimal_archive(0, b"; HEADER_BLOCK_START\nG28\n");
        let archive = Archive::parse(&bytes).unwrap();
        assert_eq!(archive.len(), 2);

        let plate = archive.find("metadata/plate_1.gcode").unwrap();
        assert_eq!(
            read_entry_payload(&bytes, plate).unwrap(),
            b"; HEADER_BLOCK_START\r\nG28\r\n"
        );

        let types = archive.find(CONTENT_TYPES_PATH).unwrap();
        let xml = archive.extract(types).unwrap();
        assert!(
            String::from_utf8(xml)
                .unwrap()
                .contains("Extension=\"gcode\" ContentType=\"text/plain\"")
        );
    }

    #[test]
    fn test_existing_carriage_returns_are_kept() {
        let text = b"G28\r\nG1 X1\nM400";
        let bytes = minimal_archive(3, text);
        let archive = Archive::parse(&bytes).unwrap();
        let plate = archive.find("Metadata/plate_3.gcode").unwrap();
        assert_eq!(archive.extract(plate).unwrap(), text);
    }
}
