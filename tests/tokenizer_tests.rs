// tests/tokenizer_tests.rs

use koan::{tokenize, ChunkedTokenizer, TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source).unwrap().iter().map(|t| t.kind).collect()
}

#[test]
fn test_empty_input() {
    assert!(tokenize("").unwrap().is_empty());
    assert!(tokenize(" \t\n ").unwrap().is_empty());
}

#[test]
fn test_token_text_reconstructs_trimmed_source() {
    let cases = [
        "foo",
        "foo bar",
        "  foo, bar  ",
        "a (b, c) {d} [e f]",
        "a\nb",
        "<<multi\nline>> tail",
        "[a, b,]",
        "weird-atom_$x.7 @dir GET",
    ];
    for source in cases {
        let rebuilt: String = tokenize(source)
            .unwrap()
            .iter()
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(rebuilt, source.trim(), "reconstruction failed for {:?}", source);
    }
}

#[test]
fn test_newline_is_a_branch_separator() {
    assert_eq!(kinds("a\nb"), kinds("a, b"));
}

#[test]
fn test_bracket_kinds() {
    assert_eq!(
        kinds("(a){b}[c]"),
        vec![
            TokenKind::OpenParen,
            TokenKind::Atom,
            TokenKind::CloseParen,
            TokenKind::OpenCurly,
            TokenKind::Atom,
            TokenKind::CloseCurly,
            TokenKind::OpenSquare,
            TokenKind::Atom,
            TokenKind::CloseSquare,
        ]
    );
}

#[test]
fn test_marker_tokens() {
    assert_eq!(
        kinds("& : ... 1..2 ..9 3.."),
        vec![
            TokenKind::HeadRef,
            TokenKind::PartSep,
            TokenKind::SortedSetInit,
            TokenKind::PartSep,
            TokenKind::PrevSeqRef,
            TokenKind::PartSep,
            TokenKind::PrevSeqRef,
            TokenKind::PartSep,
            TokenKind::PrevSeqRef,
            TokenKind::PartSep,
            TokenKind::PrevSeqRef,
        ]
    );
}

#[test]
fn test_atoms_may_contain_punctuation() {
    // Only whitespace, commas, and the six brackets end an atom.
    assert_eq!(kinds("a.b:c$d@e"), vec![TokenKind::Atom]);
    let tokens = tokenize("a.b:c$d@e").unwrap();
    assert_eq!(tokens[0].text, "a.b:c$d@e");
}

#[test]
fn test_quoted_text_keeps_delimiters_and_content() {
    let tokens = tokenize("<<free, text (with) [brackets]>>").unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::QuotedText);
    assert_eq!(tokens[0].text, "<<free, text (with) [brackets]>>");
}

#[test]
fn test_locations_are_one_based() {
    let tokens = tokenize("ab cd").unwrap();
    assert_eq!(tokens[0].start.line, 1);
    assert_eq!(tokens[0].start.column, 1);
    assert_eq!(tokens[2].start.column, 4);
    assert_eq!(tokens[2].start.offset, 3);
}

#[test]
fn test_chunked_matches_one_shot_for_all_splits() {
    let source = "alpha (beta, gamma) {x}\n[a :b] &c 1..2 <<free text>>";
    let expected = tokenize(source).unwrap();
    for split in 1..source.len() {
        let mut stream = ChunkedTokenizer::new();
        let mut tokens = stream.push(&source[..split]).unwrap();
        tokens.extend(stream.push(&source[split..]).unwrap());
        tokens.extend(stream.finish().unwrap());
        assert_eq!(tokens, expected, "split at byte {} diverged", split);
    }
}

#[test]
fn test_chunked_stream_order_is_source_order() {
    let mut stream = ChunkedTokenizer::new();
    let mut offsets = Vec::new();
    for chunk in ["a b ", "c, d ", "e"] {
        for token in stream.push(chunk).unwrap() {
            offsets.push(token.start.offset);
        }
    }
    for token in stream.finish().unwrap() {
        offsets.push(token.start.offset);
    }
    let mut sorted = offsets.clone();
    sorted.sort_unstable();
    assert_eq!(offsets, sorted);
}
