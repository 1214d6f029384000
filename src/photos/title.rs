use super::Position;
use regex::Regex;
use std::sync::LazyLock;

static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{3}").expect("valid number pattern"));

static POSITION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)position=(top|bottom|left|right)").expect("valid position pattern")
});

/// What a photo title says about the photo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTitle {
    /// The first run of three ASCII digits, still as text ("025").
    pub number: Option<String>,
    pub position: Option<Position>,
}

/// Reads the catalog number and placement hint out of a free-text title.
///
/// Never fails: a title without three digits simply has no number.
pub fn parse_title(title: &str) -> ParsedTitle {
    let number = NUMBER_PATTERN
        .find(title)
        .map(|m| m.as_str().to_string());

    let explicit = POSITION_PATTERN
        .captures(title)
        .and_then(|caps| caps.get(1))
        .and_then(|m| Position::from_keyword(m.as_str()));

    let position = explicit.or_else(|| title.chars().find_map(Position::from_arrow));

    ParsedTitle { number, position }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_is_first_three_digit_run() {
        assert_eq!(parse_title("025 Pikachu").number.as_deref(), Some("025"));
        assert_eq!(parse_title("Pikachu #025").number.as_deref(), Some("025"));
        assert_eq!(parse_title("150 and 151").number.as_deref(), Some("150"));
        assert_eq!(parse_title("IMG_20180412").number.as_deref(), Some("201"));
    }

    #[test]
    fn test_only_ascii_digits_count() {
        assert_eq!(
            parse_title("ピカチュウ ０２５ / 025").number.as_deref(),
            Some("025")
        );
        assert_eq!(parse_title("Pikachu ٠٢٥").number, None);
    }

    #[test]
    fn test_titles_without_number() {
        assert_eq!(parse_title("Pikachu").number, None);
        assert_eq!(parse_title("25 Pikachu").number, None);
        assert_eq!(parse_title("").number, None);
        assert_eq!(parse_title(""), ParsedTitle::default());
    }

    #[test]
    fn test_explicit_position_marker() {
        let parsed = parse_title("006 Charizard position=top");
        assert_eq!(parsed.position, Some(Position::Top));

        let parsed = parse_title("006 Charizard POSITION=Left");
        assert_eq!(parsed.position, Some(Position::Left));

        let parsed = parse_title("006 Charizard position=middle");
        assert_eq!(parsed.position, None);
    }

    #[test]
    fn test_arrow_glyphs() {
        assert_eq!(parse_title("001 ↑").position, Some(Position::Top));
        assert_eq!(parse_title("001 ↓").position, Some(Position::Bottom));
        assert_eq!(parse_title("001 ←").position, Some(Position::Left));
        assert_eq!(parse_title("001 →").position, Some(Position::Right));
    }

    #[test]
    fn test_explicit_marker_beats_arrow() {
        let parsed = parse_title("← 001 position=bottom");
        assert_eq!(parsed.position, Some(Position::Bottom));
        assert_eq!(parsed.number.as_deref(), Some("001"));
    }
}
