#[cfg(test)]
mod parser_tests {
    use treelox::ast::{Expr, Index, Stmt};
    use treelox::ast_printer::AstPrinter;
    use treelox::error::LoxError;
    use treelox::session::{parse_expression, parse_program};

    fn print_program(source: &str) -> Vec<String> {
        parse_program(source.as_bytes())
            .unwrap()
            .iter()
            .map(AstPrinter::print_stmt)
            .collect()
    }

    fn static_errors(source: &str) -> Vec<String> {
        match parse_program(source.as_bytes()) {
            Err(LoxError::Static(errors)) => errors.iter().map(ToString::to_string).collect(),
            other => panic!("expected static errors, got {:?}", other.map(|s| s.len())),
        }
    }

    #[test]
    fn test_expression_precedence() {
        let expr = parse_expression(b"-1 + 2 * 3 == 7 or !false and nil").unwrap();
        assert_eq!(
            AstPrinter::print(&expr),
            "(or (== (+ (- 1.0) (* 2.0 3.0)) 7.0) (and (! false) nil))"
        );
    }

    #[test]
    fn test_for_loop_desugars_to_while() {
        let printed = print_program("for (var i = 0; i < 3; i += 1) print i;");
        assert_eq!(
            printed,
            vec!["(block (var i 0.0) (while (< i 3.0) (block (print i) (; (+= i 1.0)))))"]
        );
    }

    #[test]
    fn test_for_without_clauses_loops_on_true() {
        let printed = print_program("for (;;) break;");
        assert_eq!(printed, vec!["(while true (break))"]);
    }

    #[test]
    fn test_class_with_superclass_and_statics() {
        let program = parse_program(
            b"class B < A { init(x) { this.x = x; } static make() { return B(1); } }",
        )
        .unwrap();

        let Stmt::Class {
            name,
            superclass,
            methods,
            statics,
        } = &program[0]
        else {
            panic!("expected a class declaration");
        };

        assert_eq!(name.lexeme, "B");
        assert!(matches!(superclass, Some(Expr::Variable { name, .. }) if name.lexeme == "A"));
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].params.len(), 1);
        assert_eq!(statics.len(), 1);
        assert_eq!(statics[0].name.lexeme, "make");
    }

    #[test]
    fn test_lambda_in_expression_position() {
        let printed = print_program("var f = fun (a, b) { return a + b; };");
        assert_eq!(printed, vec!["(var f (lambda (a b) (return (+ a b))))"]);
    }

    #[test]
    fn test_collections_and_indexing() {
        let printed = print_program("var m = {\"a\": [1, 2][-1]}; print m[\"a\"];");
        assert_eq!(printed[0], "(var m (map (a ([] (array 1.0 2.0) (- 1.0)))))");
        assert_eq!(printed[1], "(print ([] m a))");

        // slices are not assignable
        let errors = static_errors("x[1:] = 2;");
        assert_eq!(errors, vec!["[line 1] Error at '=': Invalid assignment target"]);
    }

    #[test]
    fn test_slice_forms() {
        for (source, has_start, has_stop) in [
            ("a[1:2]", true, true),
            ("a[:2]", false, true),
            ("a[1:]", true, false),
            ("a[:]", false, false),
        ] {
            let Expr::IndexGet { index, .. } = parse_expression(source.as_bytes()).unwrap() else {
                panic!("expected an index expression for {}", source);
            };
            let Index::Slice { start, stop } = index else {
                panic!("expected a slice for {}", source);
            };
            assert_eq!(start.is_some(), has_start, "{}", source);
            assert_eq!(stop.is_some(), has_stop, "{}", source);
        }
    }

    #[test]
    fn test_compound_assignment_targets() {
        let printed = print_program("a -= 1; o.f *= 2; arr[0] %= 3;");
        assert_eq!(
            printed,
            vec![
                "(; (-= a 1.0))",
                "(; (*= (. o f) 2.0))",
                "(; (%= ([] arr 0.0) 3.0))",
            ]
        );
    }

    #[test]
    fn test_context_errors_are_all_reported() {
        let errors = static_errors(
            "return 1;\nbreak;\nprint this;\nfun f() { while (true) { fun g() { break; } } }",
        );
        assert_eq!(
            errors,
            vec![
                "[line 1] Error at 'return': Can't return from top-level code",
                "[line 2] Error at 'break': Must be in a loop to use 'break'",
                "[line 3] Error at 'this': Can't use 'this' outside of a class",
                "[line 4] Error at 'break': Must be in a loop to use 'break'",
            ]
        );
    }

    #[test]
    fn test_super_outside_class() {
        let errors = static_errors("super.foo();");
        assert_eq!(
            errors,
            vec!["[line 1] Error at 'super': Can't use 'super' outside of a class"]
        );
    }

    #[test]
    fn test_synchronizes_after_syntax_error() {
        let errors = static_errors("var = 1;\nprint 2;\nprint (;");
        assert_eq!(
            errors,
            vec![
                "[line 1] Error at '=': Expect variable name",
                "[line 3] Error at ';': Expect expression",
            ]
        );
    }

    #[test]
    fn test_missing_semicolon_at_end() {
        let errors = static_errors("print 1");
        assert_eq!(errors, vec!["[line 1] Error at end: Expect ';' after value"]);
    }

    #[test]
    fn test_too_many_arguments() {
        let args = vec!["1"; 256].join(", ");
        let errors = static_errors(&format!("f({});", args));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].ends_with("Can't have more than 255 arguments"));
    }

    #[test]
    fn test_lex_errors_stop_before_parsing() {
        let errors = static_errors("var a = $;\nvar b = #;");
        assert_eq!(
            errors,
            vec![
                "[line 1] Error: Unexpected character: $",
                "[line 2] Error: Unexpected character: #",
            ]
        );
    }
}
