// Font tier selection and server-line wrapping

use imgwelcome::banner::{select_tier, wrap_text, TextLayout};
use rstest::rstest;

#[rstest]
#[case("Bob", "0001", 30.0)]
#[case("twelve_chars", "0001", 30.0)] // 17
#[case("thirteen_char", "0001", 22.0)] // 18
#[case("eighteen_chars_xyz", "0001", 22.0)] // 23
#[case("nineteen_chars_wxyz", "0001", 18.0)] // 24
#[case("twenty_seven_characters_xxx", "0001", 18.0)] // 32
#[case("twenty_eight_characters_wxyz", "0001", 12.0)] // 33
fn test_name_tier_by_key_length(
    #[case] name: &str,
    #[case] discriminator: &str,
    #[case] expected_size: f32,
) {
    let layout = TextLayout::new(name, discriminator, "Acme");
    assert_eq!(layout.name.font_size, expected_size);
    assert_eq!(layout.name.origin, layout.tier.origin);
}

#[test]
fn test_exactly_one_tier_per_length() {
    let mut previous = select_tier(1).font_size;
    for length in 1..=64 {
        let size = select_tier(length).font_size;
        // Sizes only ever shrink as names grow
        assert!(size <= previous);
        previous = size;
    }
}

#[rstest]
#[case("Welcome to Acme!", vec!["Welcome to Acme!"])]
#[case(
    "Welcome to The Rust Programming Language Community!",
    vec!["Welcome to The Rust", "Programming Language", "Community!"]
)]
#[case(
    "Welcome to Supercalifragilisticexpialidocious!",
    vec!["Welcome to Supercalifragi", "listicexpialidocious!"]
)]
#[case(
    "Welcome to Super-Duper-Extra-Long-Guild!",
    vec!["Welcome to Super-Duper-", "Extra-Long-Guild!"]
)]
#[case(
    "Welcome to Extremely-long-hyphenated-name-that-goes!",
    vec!["Welcome to Extremely-", "long-hyphenated-name-", "that-goes!"]
)]
#[case(
    "Welcome to 1234567890-1234567890-12345!",
    vec!["Welcome to 1234567890-", "1234567890-12345!"]
)]
fn test_server_line_wrap(#[case] text: &str, #[case] expected: Vec<&str>) {
    assert_eq!(wrap_text(text, 25), expected);
}

#[test]
fn test_wrapped_lines_respect_width() {
    let text = "Welcome to a guild whose name goes on and on and on for quite a while!";
    for line in wrap_text(text, 25) {
        assert!(line.chars().count() <= 25, "{line:?}");
    }
}
