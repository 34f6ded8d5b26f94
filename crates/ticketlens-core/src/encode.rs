//! Output row encoding.
//!
//! Every field is wrapped in double quotes and joined with commas. Embedded
//! quote characters are removed, not escaped.

/// Encode one output row as a single line (without the trailing newline).
pub fn encode_row<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|field| format!("\"{}\"", field.as_ref().replace('"', "")))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_every_field() {
        assert_eq!(encode_row(["1", "Paris", ""]), r#""1","Paris","""#);
    }

    #[test]
    fn strips_embedded_quotes() {
        assert_eq!(
            encode_row(["q-1", r#"the "Acme" store"#]),
            r#""q-1","the Acme store""#
        );
    }

    #[test]
    fn keeps_commas_inside_quotes() {
        assert_eq!(encode_row(["Paris, France"]), r#""Paris, France""#);
    }

    #[test]
    fn accepts_owned_strings() {
        let row = vec!["a".to_string(), "b".to_string()];
        assert_eq!(encode_row(&row), r#""a","b""#);
    }

    #[test]
    fn empty_row_is_empty_line() {
        assert_eq!(encode_row(Vec::<String>::new()), "");
    }
}
