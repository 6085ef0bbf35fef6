//! Minimal CSV writer for report downloads

/// Characters that make spreadsheet applications evaluate a cell as a formula
const FORMULA_PREFIXES: [char; 4] = ['=', '+', '-', '@'];

/// Accumulates CSV rows into a single UTF-8 document with CRLF line endings
#[derive(Debug, Default)]
pub struct CsvDocument {
    buffer: String,
    rows: usize,
}

impl CsvDocument {
    /// Start a document with a header row
    pub fn with_header(columns: &[&str]) -> Self {
        let mut doc = Self::default();
        doc.push_row(columns.iter().copied());
        doc.rows = 0;
        doc
    }

    /// Append a data row
    pub fn push_row<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut first = true;
        for field in fields {
            if !first {
                self.buffer.push(',');
            }
            first = false;
            self.buffer.push_str(&escape_field(field.as_ref()));
        }
        self.buffer.push_str("\r\n");
        self.rows += 1;
    }

    /// Number of data rows, excluding the header
    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn into_string(self) -> String {
        self.buffer
    }
}

/// Escape a single field.
///
/// Fields containing separators, quotes or line breaks are quoted with inner
/// quotes doubled. Fields that would be read as formulas get a leading `'`.
pub fn escape_field(value: &str) -> String {
    let neutralized;
    let value = if value.starts_with(FORMULA_PREFIXES) && !is_plain_number(value) {
        neutralized = format!("'{}", value);
        neutralized.as_str()
    } else {
        value
    };

    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn is_plain_number(value: &str) -> bool {
    value.parse::<f64>().is_ok()
}

/// Render an optional value as a cell
pub fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_plain_fields_untouched() {
        assert_eq!(escape_field("Grace"), "Grace");
        assert_eq!(escape_field(""), "");
        assert_eq!(escape_field("-12.5"), "-12.5");
    }

    #[test]
    fn test_quoting() {
        assert_eq!(escape_field("Smith, John"), "\"Smith, John\"");
        assert_eq!(escape_field("say \"amen\""), "\"say \"\"amen\"\"\"");
        assert_eq!(escape_field("line1\nline2"), "\"line1\nline2\"");
    }

    #[test]
    fn test_formula_injection_neutralized() {
        assert_eq!(escape_field("=SUM(A1:A9)"), "'=SUM(A1:A9)");
        assert_eq!(escape_field("@cmd"), "'@cmd");
        assert_eq!(escape_field("=1,2"), "\"'=1,2\"");
    }

    #[test]
    fn test_document() {
        let mut doc = CsvDocument::with_header(&["first_name", "last_name"]);
        doc.push_row(["Ruth", "O'Neil"]);
        doc.push_row(vec!["Boaz".to_string(), "Smith, Jr".to_string()]);

        assert_eq!(doc.row_count(), 2);
        assert_eq!(
            doc.into_string(),
            "first_name,last_name\r\nRuth,O'Neil\r\nBoaz,\"Smith, Jr\"\r\n"
        );
    }

    #[test]
    fn test_opt() {
        assert_eq!(opt(&Some(5)), "5");
        assert_eq!(opt::<String>(&None), "");
    }

    proptest! {
        #[test]
        fn quoted_fields_have_balanced_quotes(value in ".*") {
            let escaped = escape_field(&value);
            if escaped.starts_with('"') {
                let inner = &escaped[1..escaped.len() - 1];
                prop_assert_eq!(inner.replace("\"\"", "").matches('"').count(), 0);
            } else {
                prop_assert!(!escaped.contains([',', '"', '\r', '\n']));
            }
        }
    }
}
