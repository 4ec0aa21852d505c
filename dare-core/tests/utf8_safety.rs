/// UTF-8 Safety Tests
///
/// Network bodies deliver bytes, and chunk boundaries fall wherever they like,
/// including inside multi-byte characters. These tests pin the invariant that
/// `feed_bytes` never splits or drops a character that arrived whole.

use dare_core::{ExtractError, Extractor};

fn feed_in_byte_chunks(text: &str, chunk: usize) -> (Result<dare_core::Artifact, ExtractError>, String) {
    let mut display = Vec::new();
    let mut extractor = Extractor::new(&mut display);
    for piece in text.as_bytes().chunks(chunk) {
        extractor.feed_bytes(piece).unwrap();
    }
    let result = extractor.finalize();
    (result, String::from_utf8(display).expect("display must stay valid UTF-8"))
}

#[test]
fn test_emoji_split_across_every_byte() {
    // Emoji are 4-byte UTF-8 sequences
    let text = "Here 🚀\n``` py title=\"rocket.py\"\nprint(\"🚀 launch 🌍\")\n```\n";
    let (result, display) = feed_in_byte_chunks(text, 1);

    let artifact = result.unwrap();
    assert_eq!(artifact.name, "rocket.py");
    assert_eq!(artifact.content, "print(\"🚀 launch 🌍\")\n");
    assert_eq!(display, text);
}

#[test]
fn test_cjk_title_and_body() {
    // CJK characters are 3-byte UTF-8 sequences
    let text = "``` py title=\"你好.py\"\nprint(\"こんにちは世界\")\n```";
    for chunk in 1..=7 {
        let (result, display) = feed_in_byte_chunks(text, chunk);
        let artifact = result.unwrap();
        assert_eq!(artifact.name, "你好.py", "chunk size {}", chunk);
        assert_eq!(artifact.content, "print(\"こんにちは世界\")\n");
        assert_eq!(display, text);
    }
}

#[test]
fn test_rtl_and_combining_characters() {
    let text = format!(
        "``` py title=\"rtl.py\"\ns = \"مرحبا العالم שלום\"\nt = \"Caf{} au lait\"\n```\n",
        "e\u{0301}"
    );
    let (result, display) = feed_in_byte_chunks(&text, 3);
    let artifact = result.unwrap();
    assert!(artifact.content.contains("مرحبا العالم שלום"));
    assert!(artifact.content.contains("e\u{0301}"));
    assert_eq!(display, text);
}

#[test]
fn test_stream_cut_inside_character() {
    // The reply ends halfway through a 3-byte character
    let mut bytes = "``` py title=\"cut.py\"\nprint(1)\nx = \"".as_bytes().to_vec();
    bytes.extend_from_slice(&"€".as_bytes()[..2]);

    let mut display = Vec::new();
    let mut extractor = Extractor::new(&mut display);
    extractor.feed_bytes(&bytes).unwrap();
    let artifact = extractor.finalize().unwrap();

    assert_eq!(artifact.content, "print(1)\nx = \"\u{FFFD}");
    assert!(String::from_utf8(display).unwrap().ends_with('\u{FFFD}'));
}

#[test]
fn test_mixed_text_and_byte_feeding() {
    let mut display = Vec::new();
    let mut extractor = Extractor::new(&mut display);

    extractor.feed("``` py title=\"mix.py\"\n").unwrap();
    let snowman = "☃".as_bytes();
    extractor.feed_bytes(&snowman[..1]).unwrap();
    extractor.feed_bytes(&snowman[1..]).unwrap();
    extractor.feed("\n```\n").unwrap();

    let artifact = extractor.finalize().unwrap();
    assert_eq!(artifact.content, "☃\n");
}
