use crate::error::ExtractError;

pub const MARKER: &str = "m={sections:";

/// Isolate the `m={sections:…}` assignment from a script bundle.
///
/// Brace depth is counted from the marker start without regard to string or
/// comment context; the upstream literal never carries unbalanced braces
/// inside its strings.
pub fn extract_snippet(source: &str) -> Result<&str, ExtractError> {
    let start = source.find(MARKER).ok_or(ExtractError::MarkerNotFound)?;

    let mut depth = 0usize;
    for (i, b) in source.bytes().enumerate().skip(start) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                // A `}` before the first `{` cannot happen: the marker opens one.
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(&source[start..=i]);
                }
            }
            _ => {}
        }
    }

    Err(ExtractError::UnbalancedBraces { start })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_one() {
        let src = "var a=1;m={sections:[],intents:[]};foo()";
        assert_eq!(extract_snippet(src).unwrap(), "m={sections:[],intents:[]}");
    }

    #[test]
    fn depth_two() {
        let src = r#"x;m={sections:[{"A":[1]}],intents:[{"1. a":["x"]}]},n={}"#;
        assert_eq!(
            extract_snippet(src).unwrap(),
            r#"m={sections:[{"A":[1]}],intents:[{"1. a":["x"]}]}"#
        );
    }

    #[test]
    fn depth_six() {
        let inner = "m={sections:{a:{b:{c:{d:{e:1}}}}},intents:[]}";
        let src = format!("(function(){{{};return m}})()", inner);
        assert_eq!(extract_snippet(&src).unwrap(), inner);
    }

    #[test]
    fn stops_at_first_marker() {
        let src = "m={sections:1};m={sections:2}";
        assert_eq!(extract_snippet(src).unwrap(), "m={sections:1}");
    }

    #[test]
    fn multibyte_text_is_sliced_on_char_boundaries() {
        let src = "é;m={sections:[{\"Grammaire\":[1]}],intents:[{\"1. Accord\":[\"Ça va — oui.\"]}]};ü";
        let snippet = extract_snippet(src).unwrap();
        assert!(snippet.starts_with(MARKER));
        assert!(snippet.ends_with("]}"));
        assert!(snippet.contains("Ça va — oui."));
    }

    #[test]
    fn missing_marker() {
        let err = extract_snippet("var m={intents:[]};").unwrap_err();
        assert!(matches!(err, ExtractError::MarkerNotFound));
    }

    #[test]
    fn unbalanced_input() {
        let err = extract_snippet("xx m={sections:[{\"A\":[1]}]").unwrap_err();
        assert!(matches!(err, ExtractError::UnbalancedBraces { start: 3 }));
    }
}
