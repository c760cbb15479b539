#[cfg(test)]
mod resolver_tests {
    use treelox::ast::{Expr, Stmt};
    use treelox::error::{LoxError, ResolveErrorKind};
    use treelox::resolver::{Resolution, Resolver};
    use treelox::session::parse_program;

    fn resolve(source: &str) -> Result<(Vec<Stmt>, Resolution), LoxError> {
        let program = parse_program(source.as_bytes()).unwrap();
        let resolution = Resolver::new().resolve(&program)?;
        Ok((program, resolution))
    }

    fn error_kinds(source: &str) -> Vec<ResolveErrorKind> {
        match resolve(source) {
            Err(LoxError::Static(errors)) => errors
                .into_iter()
                .map(|e| match e {
                    LoxError::Resolve(e) => e.kind,
                    other => panic!("unexpected error {}", other),
                })
                .collect(),
            Err(other) => panic!("unexpected error {}", other),
            Ok(_) => panic!("expected resolve errors"),
        }
    }

    #[test]
    fn test_globals_are_left_unresolved() {
        let (_, resolution) = resolve("var a = 1; print a;").unwrap();
        assert!(resolution.locals.is_empty());
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn test_binding_distances() {
        let (program, resolution) = resolve("{ var a = 1; { { print a; } } }").unwrap();

        // block → block → block → print a
        let Stmt::Block(outer) = &program[0] else {
            panic!("expected block")
        };
        let Stmt::Block(middle) = &outer[1] else {
            panic!("expected block")
        };
        let Stmt::Block(inner) = &middle[0] else {
            panic!("expected block")
        };
        let Stmt::Print(Expr::Variable { id, .. }) = &inner[0] else {
            panic!("expected print of a variable")
        };

        assert_eq!(resolution.locals.get(id), Some(&2));
    }

    #[test]
    fn test_read_in_own_initializer() {
        assert_eq!(
            error_kinds("{ var a = a; }"),
            vec![ResolveErrorKind::ReadLocalInOwnInitializer]
        );
    }

    #[test]
    fn test_redeclaration_in_same_scope() {
        assert_eq!(
            error_kinds("fun f(a) { var a = 1; print a; }"),
            vec![ResolveErrorKind::AlreadyInScope]
        );

        // shadowing in a nested scope is fine
        assert!(resolve("{ var a = 1; { var a = 2; print a; } print a; }").is_ok());
    }

    #[test]
    fn test_return_value_from_initializer() {
        assert_eq!(
            error_kinds("class A { init() { return 1; } }"),
            vec![ResolveErrorKind::ReturnFromInit]
        );

        assert!(resolve("class A { init() { return; } }").is_ok());
    }

    #[test]
    fn test_super_placement() {
        assert_eq!(
            error_kinds("class A { f() { super.f(); } }"),
            vec![ResolveErrorKind::SuperWithNoSuperClass]
        );
        assert_eq!(
            error_kinds("class A {} class B < A { static f() { super.f(); } }"),
            vec![ResolveErrorKind::SuperInStatic]
        );
    }

    #[test]
    fn test_static_init_and_self_inheritance() {
        assert_eq!(
            error_kinds("class A { static init() {} }"),
            vec![ResolveErrorKind::InitIsStatic]
        );
        assert_eq!(
            error_kinds("class A < A {}"),
            vec![ResolveErrorKind::InheritsSelf]
        );
    }

    #[test]
    fn test_all_errors_are_collected() {
        assert_eq!(
            error_kinds("{ var a = a; var a = 2; } class C { static init() {} }"),
            vec![
                ResolveErrorKind::ReadLocalInOwnInitializer,
                ResolveErrorKind::AlreadyInScope,
                ResolveErrorKind::InitIsStatic,
            ]
        );
    }

    #[test]
    fn test_unread_locals_are_warnings_in_line_order() {
        let (_, resolution) = resolve("{\n var b = 1;\n var a = 2;\n var used = 3;\n print used;\n}").unwrap();

        let warnings: Vec<String> = resolution.warnings.iter().map(ToString::to_string).collect();
        assert_eq!(
            warnings,
            vec![
                "[line 2] Warning at 'b': Local variable is not used",
                "[line 3] Warning at 'a': Local variable is not used",
            ]
        );
        assert!(resolution.warnings.iter().all(|w| w.is_warning()));
    }

    #[test]
    fn test_assignment_is_not_a_read() {
        let (_, resolution) = resolve("{ var a = 1; a = 2; }").unwrap();
        assert_eq!(resolution.warnings.len(), 1);
        assert_eq!(resolution.warnings[0].lexeme, "a");
    }

    #[test]
    fn test_compound_assignment_reads_the_target() {
        let (_, resolution) = resolve("{ var n = 0; n += 1; }").unwrap();
        assert!(resolution.warnings.is_empty());

        let (_, resolution) = resolve("fun f() { var total = 1; total *= 2; } f();").unwrap();
        assert!(resolution.warnings.is_empty());
    }

    #[test]
    fn test_super_in_function_nested_in_static() {
        assert_eq!(
            error_kinds(
                "class A { m() { return 1; } }\n\
                 class B < A { static s() { var f = fun () { return super.m(); }; return f(); } }"
            ),
            vec![ResolveErrorKind::SuperInStatic]
        );
        assert_eq!(
            error_kinds(
                "class A { m() {} }\n\
                 class B < A { static s() { fun inner() { fun deeper() { super.m(); } deeper(); } inner(); } }"
            ),
            vec![ResolveErrorKind::SuperInStatic]
        );

        // a class declared inside a static method has its own `super`
        assert!(resolve(
            "class A { m() {} }\n\
             class B < A { static s() { class C < A { m() { super.m(); } } return C; } }"
        )
        .is_ok());
    }

    #[test]
    fn test_this_and_super_are_never_reported() {
        let (_, resolution) = resolve(
            "class A { f() { return 1; } } class B < A { f() { return super.f(); } g(unused) {} }",
        )
        .unwrap();

        let names: Vec<&str> = resolution
            .warnings
            .iter()
            .map(|w| w.lexeme.as_str())
            .collect();
        assert_eq!(names, vec!["unused"]);
    }
}
