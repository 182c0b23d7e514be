/// Extract the mandatory-field marker from header or configuration text.
///
/// A leading `*` (optionally separated by whitespace) or a trailing `(*)`
/// marks the field required; either form is stripped from the returned name.
/// Blank input, or a marker with no name left after stripping, yields `None`.
///
/// The same grammar serves two sources: the declarative column list and live
/// header-row content. Callers combine the two required flags with logical
/// OR.
pub fn parse_marker(text: &str) -> Option<(String, bool)> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(rest) = trimmed.strip_prefix('*') {
        let name = rest.trim();
        if name.is_empty() {
            return None;
        }
        return Some((name.to_string(), true));
    }

    if let Some(rest) = trimmed.strip_suffix("(*)") {
        let name = rest.trim();
        if name.is_empty() {
            return None;
        }
        return Some((name.to_string(), true));
    }

    Some((trimmed.to_string(), false))
}

#[cfg(test)]
mod tests {
    use super::parse_marker;

    #[test]
    fn leading_star_marks_required() {
        assert_eq!(parse_marker("* Name"), Some(("Name".to_string(), true)));
        assert_eq!(parse_marker("*Name"), Some(("Name".to_string(), true)));
        assert_eq!(parse_marker("  * Name  "), Some(("Name".to_string(), true)));
    }

    #[test]
    fn trailing_parenthesized_star_marks_required() {
        assert_eq!(parse_marker("Name (*)"), Some(("Name".to_string(), true)));
        assert_eq!(parse_marker("Name(*)"), Some(("Name".to_string(), true)));
    }

    #[test]
    fn unmarked_name_is_optional() {
        assert_eq!(parse_marker("Name"), Some(("Name".to_string(), false)));
    }

    #[test]
    fn blank_input_yields_none() {
        assert_eq!(parse_marker(""), None);
        assert_eq!(parse_marker("   "), None);
        assert_eq!(parse_marker("*"), None);
        assert_eq!(parse_marker("(*)"), None);
    }
}
