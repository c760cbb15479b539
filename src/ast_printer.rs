use crate::ast::{Expr, FunctionDecl, Index, LiteralValue, Stmt};

/// Converts syntax trees to the Crafting‑Interpreters parenthesised prefix
/// form used by the `parse` command.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),

                LiteralValue::False => "false".into(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => s.clone(),

                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        // 3.0 → 3.0
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            // ── operators ───────────────────────────────────────────────
            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            // ── names ───────────────────────────────────────────────────
            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign {
                name,
                operator,
                value,
                ..
            } => format!(
                "({} {} {})",
                operator.lexeme,
                name.lexeme,
                Self::print(value)
            ),

            Expr::This { .. } => "this".into(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),

            // ── calls and properties ────────────────────────────────────
            Expr::Call {
                callee, arguments, ..
            } => Self::list(&format!("call {}", Self::print(callee)), arguments),

            Expr::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                operator,
                value,
            } => format!(
                "({} (. {} {}) {})",
                operator.lexeme,
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::Lambda(decl) => Self::function("lambda", decl),

            // ── collections ─────────────────────────────────────────────
            Expr::Array { elements, .. } => Self::list("array", elements),

            Expr::Map { entries, .. } => {
                let mut s = String::from("(map");
                for (key, value) in entries {
                    s.push_str(&format!(" ({} {})", Self::print(key), Self::print(value)));
                }
                s.push(')');
                s
            }

            Expr::IndexGet { object, index, .. } => match index {
                Index::Single(i) => format!("([] {} {})", Self::print(object), Self::print(i)),
                Index::Slice { start, stop } => format!(
                    "([:] {} {} {})",
                    Self::print(object),
                    Self::bound(start.as_deref()),
                    Self::bound(stop.as_deref())
                ),
            },

            Expr::IndexSet {
                object,
                index,
                operator,
                value,
                ..
            } => format!(
                "({} ([] {} {}) {})",
                operator.lexeme,
                Self::print(object),
                Self::print(index),
                Self::print(value)
            ),
        }
    }

    /// Statements print one per call; nested bodies are inlined.
    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", Self::print(expr)),

            Stmt::Print(expr) => format!("(print {})", Self::print(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(init) => format!("(var {} {})", name.lexeme, Self::print(init)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::Block(stmts) => Self::block("block", stmts),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if-else {} {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch),
                    Self::print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => format!(
                "(while {} {})",
                Self::print(condition),
                Self::print_stmt(body)
            ),

            Stmt::Break { .. } => "(break)".into(),

            Stmt::Return { value, .. } => match value {
                Some(v) => format!("(return {})", Self::print(v)),
                None => "(return)".into(),
            },

            Stmt::Function(decl) => Self::function(&format!("fun {}", decl.name.lexeme), decl),

            Stmt::Class {
                name,
                superclass,
                methods,
                statics,
            } => {
                let mut s = format!("(class {}", name.lexeme);

                if let Some(sup) = superclass {
                    s.push_str(&format!(" < {}", Self::print(sup)));
                }

                for method in methods {
                    s.push(' ');
                    s.push_str(&Self::function(&format!("fun {}", method.name.lexeme), method));
                }

                for method in statics {
                    s.push(' ');
                    s.push_str(&Self::function(
                        &format!("static {}", method.name.lexeme),
                        method,
                    ));
                }

                s.push(')');
                s
            }
        }
    }

    fn list(head: &str, items: &[Expr]) -> String {
        let mut s = format!("({}", head);
        for item in items {
            s.push(' ');
            s.push_str(&Self::print(item));
        }
        s.push(')');
        s
    }

    fn block(head: &str, stmts: &[Stmt]) -> String {
        let mut s = format!("({}", head);
        for stmt in stmts {
            s.push(' ');
            s.push_str(&Self::print_stmt(stmt));
        }
        s.push(')');
        s
    }

    fn function(head: &str, decl: &FunctionDecl) -> String {
        let params = decl
            .params
            .iter()
            .map(|p| p.lexeme.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        Self::block(&format!("{} ({})", head, params), &decl.body)
    }

    fn bound(expr: Option<&Expr>) -> String {
        expr.map_or_else(|| "nil".into(), Self::print)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn parse_expr(src: &str) -> Expr {
        let tokens = Scanner::new(src.as_bytes())
            .collect::<crate::error::Result<Vec<_>>>()
            .unwrap();
        Parser::new(tokens).parse_expression().unwrap()
    }

    #[test]
    fn prints_precedence_as_nesting() {
        assert_eq!(
            AstPrinter::print(&parse_expr("1 + 2 * (3 - 4)")),
            "(+ 1.0 (* 2.0 (group (- 3.0 4.0))))"
        );
    }

    #[test]
    fn prints_slices_with_missing_bounds_as_nil() {
        assert_eq!(AstPrinter::print(&parse_expr("a[:2]")), "([:] a nil 2.0)");
    }

    #[test]
    fn prints_compound_assignment_with_its_operator() {
        assert_eq!(AstPrinter::print(&parse_expr("x.y += 1")), "(+= (. x y) 1.0)");
    }
}
