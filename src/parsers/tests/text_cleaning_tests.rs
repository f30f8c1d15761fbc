use crate::parsers::text;

#[cfg(test)]
mod basic_tests {
    use super::*;

    #[test]
    fn test_empty_text() {
        assert_eq!(text::clean_text(""), "");
        assert_eq!(text::clean_text("   \n   \t   \r\n   "), "");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(text::clean_text("Hello, world!"), "Hello, world!");
    }

    #[test]
    fn test_tags_are_stripped() {
        let input = "<p>Soft <strong>organic</strong> cotton.</p><p>Machine washable.</p>";
        assert_eq!(
            text::clean_text(input),
            "Soft organic cotton. Machine washable."
        );
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        let input = "  Line 1  \n\n  Line 2  \t\r\n  Line    3  ";
        assert_eq!(text::clean_text(input), "Line 1 Line 2 Line 3");
    }

    #[test]
    fn test_nested_tag_residue() {
        assert_eq!(text::clean_text("a<<b>b>c"), "a< b>c");
        assert_eq!(text::clean_text("x <<i>i> y"), "x < i> y");
        assert_eq!(text::clean_text("<<b>p>Hi</p>"), "< p>Hi");
    }

    #[test]
    fn test_comparisons_are_text() {
        assert_eq!(text::clean_text("5 < 6 and 7 > 3"), "5 < 6 and 7 > 3");
        assert_eq!(
            text::clean_text("Fits waists < 30in and heights > 5ft."),
            "Fits waists < 30in and heights > 5ft."
        );
        assert_eq!(text::clean_text("a <b>bold</b> <3"), "a bold <3");
    }

    #[test]
    fn test_tags_only_is_empty() {
        assert_eq!(text::clean_text("<div><span></span><br/></div>"), "");
    }
}

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_split_into_segments() {
        assert!(text::split_into_segments("").is_empty());

        assert_eq!(text::split_into_segments("one line"), vec!["one line"]);

        assert_eq!(
            text::split_into_segments("a  b\n\n  c\n"),
            vec!["a", "b", "c"]
        );

        assert_eq!(
            text::split_into_segments("first    second"),
            vec!["first", "second"]
        );
    }

    #[test]
    fn test_tidy_text_keeps_angle_brackets() {
        assert_eq!(text::tidy_text("  <b>  literal \n\n kept "), "<b> literal kept");
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(text::normalize_whitespace(" a \t b\n\nc "), "a b c");
        assert_eq!(text::normalize_whitespace(""), "");
    }
}

#[cfg(test)]
mod idempotence_tests {
    use super::*;

    #[test]
    fn test_cleaning_twice_equals_cleaning_once() {
        let inputs = [
            "",
            "plain",
            "<p>Hello</p>\n\n<p>World</p>",
            "  spaced    out\ttext  ",
            "a<<b>b>c <i>italic</i>",
            "<script>var x = 1;</script>Visible",
            "5 < 6 and 7 > 3",
            "unterminated <tag",
            "line1\r\nline2\n\n\nline3",
        ];

        for input in inputs {
            let once = text::clean_text(input);
            let twice = text::clean_text(&once);
            assert_eq!(once, twice, "cleaning not idempotent for {:?}", input);
            assert!(!once.contains("  "), "whitespace run left in {:?}", once);
            assert!(!once.contains('\n'));
        }
    }
}
