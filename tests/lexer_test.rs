use proptest::prelude::*;

use rubble::lexer::{
    formatter::{BasicFormatter, TokenFormatter},
    Lexer, LexicalErrorKind, Token, TokenKind,
};

fn check(input: &str, expected: &str, test_name: &str) {
    let mut lexer = Lexer::new(input);
    let formatter = BasicFormatter::new(&lexer);
    let mut lines = Vec::new();
    loop {
        match lexer.next_token() {
            Ok(token) => {
                lines.push(formatter.format(&token));
                if matches!(token.kind, TokenKind::Eof) {
                    break;
                }
            }
            Err(error) => {
                lines.push(formatter.format_lexical_error(&error));
                break;
            }
        }
    }

    assert_eq!(lines.join("\n"), expected, "Failed the test {test_name}");
}

#[test]
fn smoke_test() {
    check("", "EOF", "smoke");
}

#[test]
fn test_assignment() {
    check(
        "a = 1_000\n",
        "IDENTIFIER a\nEQUAL =\nINTEGER 1_000\nNEWLINE\nEOF",
        "assignment",
    );
}

#[test]
fn test_sigils() {
    check(
        "@x @@count $total Foo",
        "INSTANCE_VARIABLE @x\nCLASS_VARIABLE @@count\nGLOBAL_VARIABLE $total\nCONSTANT Foo\nEOF",
        "sigils",
    );
}

#[test]
fn test_keywords() {
    check(
        "class def do end if elsif else then self nil true false",
        "CLASS class\nDEF def\nDO do\nEND end\nIF if\nELSIF elsif\nELSE else\nTHEN then\n\
         SELF self\nNIL nil\nTRUE true\nFALSE false\nEOF",
        "keywords",
    );
}

#[test]
fn test_operators() {
    check(
        "|| | && != == <= >= < > ! % ;",
        "PIPE_PIPE ||\nPIPE |\nAMPERSAND_AMPERSAND &&\nBANG_EQUAL !=\nEQUAL_EQUAL ==\n\
         LESS_EQUAL <=\nGREATER_EQUAL >=\nLESS <\nGREATER >\nBANG !\nPERCENT %\nSEMICOLON ;\nEOF",
        "operators",
    );
}

#[test]
fn test_comments_and_strings() {
    check(
        "puts('it\\'s') # trailing\n\"two\"",
        "IDENTIFIER puts\nLEFT_PAREN (\nSTRING 'it\\'s'\nRIGHT_PAREN )\nNEWLINE\nSTRING \"two\"\nEOF",
        "comments_and_strings",
    );
}

#[test]
fn test_unterminated_string() {
    check("x = 'open", "IDENTIFIER x\nEQUAL =\n[line 1] Error: Unterminated string.", "unterminated");
}

#[test]
fn test_unexpected_character() {
    check("\n\n  ^", "NEWLINE\nNEWLINE\n[line 3] Error: Unexpected character: ^", "unexpected");
}

#[test]
fn test_missing_sigil_name() {
    let mut lexer = Lexer::new("@ x");
    let error = lexer.next_token().expect_err("a bare sigil is not a token");
    assert_eq!(error.kind, LexicalErrorKind::MissingVariableName("@"));
}

#[test]
fn test_iterator_stops_after_eof() {
    let tokens: Vec<_> = Lexer::new("a b").collect();
    assert_eq!(tokens.len(), 3);
    assert!(matches!(
        tokens.last(),
        Some(Ok(Token {
            kind: TokenKind::Eof,
            ..
        }))
    ));
}

// Property-based tests

fn symbol_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("(".to_string()),
        Just(")".to_string()),
        Just("[".to_string()),
        Just("]".to_string()),
        Just("{".to_string()),
        Just("}".to_string()),
        Just(",".to_string()),
        Just(".".to_string()),
        Just("-".to_string()),
        Just("+".to_string()),
        Just(";".to_string()),
        Just("*".to_string()),
        Just("%".to_string()),
        Just("!".to_string()),
        Just("!=".to_string()),
        Just("=".to_string()),
        Just("==".to_string()),
        Just("<".to_string()),
        Just("<=".to_string()),
        Just(">".to_string()),
        Just(">=".to_string()),
        Just("/".to_string()),
        Just("|".to_string()),
        Just("||".to_string()),
        Just("&&".to_string()),
    ]
}

fn integer_literal_strategy() -> impl Strategy<Value = String> {
    "[0-9][0-9_]*".prop_map(|s| s)
}

fn string_literal_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[^\"\\\\]*".prop_map(|s: String| format!("\"{}\"", s)),
        "[^'\\\\]*".prop_map(|s: String| format!("'{}'", s)),
    ]
}

fn identifier_strategy() -> impl Strategy<Value = String> {
    "[a-z_][a-zA-Z0-9_]*"
        .prop_filter("keywords are not identifiers", |s| {
            !rubble::lexer::KEYWORD_HASHMAP.contains_key(s.as_str())
        })
        .prop_map(|s: String| s)
}

fn sigil_strategy() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just("@"), Just("@@"), Just("$")],
        "[a-zA-Z_][a-zA-Z0-9_]*",
    )
        .prop_map(|(sigil, name)| format!("{sigil}{name}"))
}

fn keyword_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("class".to_string()),
        Just("def".to_string()),
        Just("do".to_string()),
        Just("else".to_string()),
        Just("elsif".to_string()),
        Just("end".to_string()),
        Just("false".to_string()),
        Just("if".to_string()),
        Just("nil".to_string()),
        Just("self".to_string()),
        Just("then".to_string()),
        Just("true".to_string()),
    ]
}

fn comment_strategy() -> impl Strategy<Value = String> {
    "[^\n]*".prop_map(|s: String| format!("#{}\n", s))
}

fn token_sequence_strategy() -> impl Strategy<Value = Vec<String>> {
    const MIN_TOKEN_COUNT: usize = 1;
    const MAX_TOKEN_COUNT: usize = 100;
    prop::collection::vec(
        prop_oneof![
            symbol_strategy(),
            integer_literal_strategy(),
            string_literal_strategy(),
            identifier_strategy(),
            sigil_strategy(),
            keyword_strategy(),
        ],
        MIN_TOKEN_COUNT..MAX_TOKEN_COUNT,
    )
}

fn count_tokens(input: &str) -> Result<usize, TestCaseError> {
    let mut lexer = Lexer::new(input);
    let mut num_tokens = 0;
    loop {
        num_tokens += 1;
        match lexer.next_token() {
            Ok(Token {
                kind: TokenKind::Eof,
                ..
            }) => return Ok(num_tokens),
            Ok(_) => {}
            Err(error) => return Err(TestCaseError::fail(format!("{error:?}"))),
        }
    }
}

proptest! {
    #[test]
    fn lexer_handles_valid_tokens_without_comments(input in token_sequence_strategy()) {
        // Add 1 to include EOF token
        let expected_num_tokens = input.len() + 1;
        let input = input.join(" ");
        prop_assert_eq!(count_tokens(&input)?, expected_num_tokens);
    }

    #[test]
    fn lexer_skips_comments(input in token_sequence_strategy(), comment in comment_strategy()) {
        // Every comment leaves its line break behind as a NEWLINE token
        let expected_num_tokens = input.len() + 2;
        let input = format!("{comment}{}", input.join(" "));
        prop_assert_eq!(count_tokens(&input)?, expected_num_tokens);
    }
}
