//! Re-indentation of XML bodies for display.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::Event;

const INDENT_WIDTH: usize = 3;

/// Re-indent an XML document for display.
///
/// Input that is not well-formed XML is returned unchanged (lossily
/// decoded as UTF-8), so this never fails.
///
/// ```
/// use siri_sm::siri::pretty_print_xml;
///
/// assert_eq!(pretty_print_xml(b"<a><b>x</b></a>"), "<a>\n   <b>x</b>\n</a>");
/// assert_eq!(pretty_print_xml(b"<a><b></a>"), "<a><b></a>");
/// ```
pub fn pretty_print_xml(raw: &[u8]) -> String {
    reindent(raw).unwrap_or_else(|| String::from_utf8_lossy(raw).into_owned())
}

fn reindent(raw: &[u8]) -> Option<String> {
    let mut reader = Reader::from_reader(raw);
    reader.config_mut().trim_text(true);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_WIDTH);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf).ok()? {
            Event::Eof => break,
            event => writer.write_event(event).ok()?,
        }
        buf.clear();
    }

    String::from_utf8(writer.into_inner()).ok()
}
