#[cfg(test)]
mod scanner_tests {
    use treelox::error::LoxError;
    use treelox::scanner::*;
    use treelox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source.as_bytes());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})[]:",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::LEFT_BRACKET, "["),
                (TokenType::RIGHT_BRACKET, "]"),
                (TokenType::COLON, ":"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_compound_operators() {
        assert_token_sequence(
            "a += 1; b -= 2; c *= 3; d /= 4; e %= 5 % 6",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::PLUS_EQUAL, "+="),
                (TokenType::NUMBER(0.0), "1"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::MINUS_EQUAL, "-="),
                (TokenType::NUMBER(0.0), "2"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::IDENTIFIER, "c"),
                (TokenType::STAR_EQUAL, "*="),
                (TokenType::NUMBER(0.0), "3"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::IDENTIFIER, "d"),
                (TokenType::SLASH_EQUAL, "/="),
                (TokenType::NUMBER(0.0), "4"),
                (TokenType::SEMICOLON, ";"),
                (TokenType::IDENTIFIER, "e"),
                (TokenType::PERCENT_EQUAL, "%="),
                (TokenType::NUMBER(0.0), "5"),
                (TokenType::PERCENT, "%"),
                (TokenType::NUMBER(0.0), "6"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_keywords_include_break_and_static() {
        assert_token_sequence(
            "class static break breaks",
            &[
                (TokenType::CLASS, "class"),
                (TokenType::STATIC, "static"),
                (TokenType::BREAK, "break"),
                (TokenType::IDENTIFIER, "breaks"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_comments_are_skipped_and_lines_counted() {
        let source = "// line one\n/* a /* nested */\n comment */ x";
        let tokens: Vec<Token> = Scanner::new(source.as_bytes())
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].lexeme, "x");
        assert_eq!(tokens[0].line, 3);
    }

    #[test]
    fn test_literal_values() {
        let tokens: Vec<Token> = Scanner::new(b"\"hi there\" 12.5 7")
            .filter_map(Result::ok)
            .collect();

        assert_eq!(tokens[0].to_string(), "STRING \"hi there\" hi there");
        assert_eq!(tokens[1].to_string(), "NUMBER 12.5 12.5");
        assert_eq!(tokens[2].to_string(), "NUMBER 7 7.0");
        assert_eq!(tokens[3].to_string(), "EOF  null");
    }

    #[test]
    fn test_unterminated_string_and_comment() {
        let errors: Vec<LoxError> = Scanner::new(b"\"open")
            .filter_map(Result::err)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 1] Error: Unterminated string.");

        let errors: Vec<LoxError> = Scanner::new(b"/* never\nclosed")
            .filter_map(Result::err)
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 2] Error: Unterminated comment.");
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source.as_bytes());

        let results: Vec<_> = scanner.collect();

        // 0: COMMA ','
        // 1: DOT '.'
        // 2: Error for '$'
        // 3: LEFT_PAREN '('
        // 4: Error for '#'
        // 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character"),
                "Error message should contain 'Unexpected character', got: {}",
                err
            );
        }

        fn assert_token_matches(
            result: &Result<Token, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(
                        token.token_type, expected_type,
                        "Expected token type {:?}, got {:?}",
                        expected_type, token.token_type
                    );
                    assert_eq!(
                        token.lexeme, expected_lexeme,
                        "Expected lexeme '{}', got '{}'",
                        expected_lexeme, token.lexeme
                    );
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }
}
