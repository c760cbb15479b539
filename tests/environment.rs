#[cfg(test)]
mod environment_tests {
    use std::rc::Rc;

    use treelox::environment::{Env, Environment};
    use treelox::token::Token;
    use treelox::value::Value;

    fn name(lexeme: &str) -> Token {
        Token::synthetic(lexeme, 1)
    }

    /// globals ← middle ← inner
    fn chain() -> (Env, Env, Env) {
        let globals = Environment::new().shared();
        let middle = Environment::with_enclosing(Rc::clone(&globals)).shared();
        let inner = Environment::with_enclosing(Rc::clone(&middle)).shared();
        (globals, middle, inner)
    }

    #[test]
    fn test_get_walks_the_chain() {
        let (globals, _, inner) = chain();
        globals.borrow_mut().define("a", Value::Number(1.0));

        assert_eq!(inner.borrow().get(&name("a")).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn test_undefined_variable() {
        let (_, _, inner) = chain();

        let err = inner.borrow().get(&name("missing")).unwrap_err();
        assert_eq!(err.to_string(), "[line 1] Runtime error: Undefined variable 'missing'.");
    }

    #[test]
    fn test_assign_mutates_the_defining_scope() {
        let (globals, middle, inner) = chain();
        middle.borrow_mut().define("a", Value::Number(1.0));

        inner
            .borrow_mut()
            .assign(&name("a"), Value::Number(2.0))
            .unwrap();

        assert_eq!(middle.borrow().get(&name("a")).unwrap(), Value::Number(2.0));
        assert!(globals.borrow().get(&name("a")).is_err());
    }

    #[test]
    fn test_assign_never_creates_a_binding() {
        let (globals, _, inner) = chain();

        assert!(inner
            .borrow_mut()
            .assign(&name("a"), Value::Nil)
            .is_err());
        assert!(globals.borrow().get(&name("a")).is_err());
    }

    #[test]
    fn test_define_replaces_existing_binding() {
        let env = Environment::new().shared();
        env.borrow_mut().define("a", Value::Number(1.0));
        env.borrow_mut().define("a", Value::String("again".into()));

        assert_eq!(
            env.borrow().get(&name("a")).unwrap(),
            Value::String("again".into())
        );
    }

    #[test]
    fn test_get_at_skips_shadowing_bindings() {
        let (globals, _, inner) = chain();
        globals.borrow_mut().define("a", Value::Number(1.0));
        inner.borrow_mut().define("a", Value::Number(3.0));

        assert_eq!(
            Environment::get_at(&inner, 2, &name("a")).unwrap(),
            Value::Number(1.0)
        );
        assert_eq!(
            Environment::get_at(&inner, 0, &name("a")).unwrap(),
            Value::Number(3.0)
        );
        // no search: the middle scope has no `a`
        assert!(Environment::get_at(&inner, 1, &name("a")).is_err());
    }

    #[test]
    fn test_assign_at() {
        let (globals, middle, inner) = chain();
        globals.borrow_mut().define("a", Value::Number(1.0));
        middle.borrow_mut().define("a", Value::Number(2.0));

        Environment::assign_at(&inner, 2, &name("a"), Value::Bool(true)).unwrap();

        assert_eq!(globals.borrow().get(&name("a")).unwrap(), Value::Bool(true));
        assert_eq!(middle.borrow().get(&name("a")).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_ancestor_past_the_root() {
        let (globals, _, inner) = chain();

        let root = Environment::ancestor(&inner, 2).unwrap();
        assert!(Rc::ptr_eq(&root, &globals));
        assert!(Environment::ancestor(&inner, 3).is_none());
    }
}
