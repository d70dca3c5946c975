//! Small writers functions to produce tab-separated fact rows.
//!
//! A row is a list of columns separated by tabulations and terminated by a
//! newline. Column contents are escaped so that no value can break the row
//! structure: backslashes, double quotes, tabulations and line breaks are
//! written as two-characters escape sequences.

use std::borrow::Cow;
use std::io::{Result, Write};

/// Escapes a column value.
///
/// Values that need no escaping are returned borrowed.
#[must_use]
pub fn escape_column(value: &str) -> Cow<'_, str> {
    if !value.contains(['\\', '"', '\t', '\n', '\r']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\t' => escaped.push_str("\\t"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Writes one escaped row in given output.
pub fn row<W: Write, S: AsRef<str>>(output: &mut W, columns: &[S]) -> Result<usize> {
    let mut sz = 0;
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            sz += tag(output, "\t")?;
        }
        sz += tag(output, &escape_column(column.as_ref()))?;
    }
    sz += tag(output, "\n")?;
    Ok(sz)
}

/// Writes a string slice in given output.
pub fn tag<W: Write>(output: &mut W, tag: &str) -> Result<usize> {
    output.write_all(tag.as_bytes())?;
    Ok(tag.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_writer() {
        let mut buf = Vec::new();
        assert_eq!(tag(&mut buf, "hello").unwrap(), 5);
        assert_eq!(buf, vec![0x68, 0x65, 0x6c, 0x6c, 0x6f]);
    }

    #[test]
    fn plain_columns_are_borrowed() {
        assert!(matches!(escape_column("<a.B: void m()>"), Cow::Borrowed(_)));
    }

    #[test]
    fn special_characters_are_escaped() {
        assert_eq!(escape_column("a\tb"), "a\\tb");
        assert_eq!(escape_column("line\nbreak"), "line\\nbreak");
        assert_eq!(escape_column("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(escape_column("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn row_writer() {
        let mut buf = Vec::new();
        let sz = row(&mut buf, &["x", "y\tz", "1"]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "x\ty\\tz\t1\n");
        assert_eq!(sz, 9);
    }
}
