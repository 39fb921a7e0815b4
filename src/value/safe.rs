use std::fmt;

/// Text that has already been escaped and must not be escaped again
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SafeString(String);

impl SafeString {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SafeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SafeString {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for SafeString {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

/// HTML-escape text, including apostrophes and backticks
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '`' => out.push_str("&#x60;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry' `c`</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39; &#x60;c&#x60;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_escaping_is_not_idempotent() {
        assert_eq!(escape_html("&"), "&amp;");
        assert_eq!(escape_html("&amp;"), "&amp;amp;");
    }

    #[test]
    fn test_safe_string_survives_repeated_conversion() {
        let safe = SafeString::new("<x>");
        let again = SafeString::from(safe.to_string());
        assert_eq!(again.to_string(), "<x>");
    }
}
