// render.rs
//! Batch to source text, once per toolchain.
//!
//! Both programs read `x` from stdin, then print every expression's value on
//! its own line, so agreeing toolchains produce byte-identical stdout.

use std::fmt::Write;

use crate::batch::Batch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    /// SysY, built by the compiler under test.
    Subject,
    /// C, built by the reference compiler.
    Reference,
}

impl Language {
    pub fn extension(&self) -> &'static str {
        match self {
            Language::Subject => "sy",
            Language::Reference => "c",
        }
    }
}

pub fn render(language: Language, batch: &Batch) -> String {
    let mut out = String::new();
    match language {
        Language::Subject => {
            out.push_str("int main() {\n  int x = getint();\n");
            for expr in batch.expressions() {
                let _ = writeln!(out, "  putint({expr}); putch(10);");
            }
        }
        Language::Reference => {
            out.push_str("#include <stdio.h>\nint main() {\n  int x; scanf(\"%d\", &x);\n");
            for expr in batch.expressions() {
                let _ = writeln!(out, "  printf(\"%d\\n\", {expr});");
            }
        }
    }
    out.push_str("  return 0;\n}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{ArithOp, Case, CmpOp, Order};

    fn sample() -> Batch {
        let case = |order| Case {
            op: ArithOp::Div,
            cmp: CmpOp::Lt,
            c1: 3,
            c2: 7,
            order,
        };
        Batch {
            cases: vec![case(Order::InputFirst), case(Order::ConstantFirst)],
            input: 5,
        }
    }

    #[test]
    fn subject_program_text() {
        assert_eq!(
            render(Language::Subject, &sample()),
            "int main() {\n  int x = getint();\n  putint(x / 3 < 7); putch(10);\n  putint(3 / x < 7); putch(10);\n  return 0;\n}\n"
        );
    }

    #[test]
    fn reference_program_text() {
        assert_eq!(
            render(Language::Reference, &sample()),
            "#include <stdio.h>\nint main() {\n  int x; scanf(\"%d\", &x);\n  printf(\"%d\\n\", x / 3 < 7);\n  printf(\"%d\\n\", 3 / x < 7);\n  return 0;\n}\n"
        );
    }

    #[test]
    fn both_programs_print_every_expression() {
        let batch = sample();
        let subject = render(Language::Subject, &batch);
        let reference = render(Language::Reference, &batch);
        assert_eq!(subject.matches("putint(").count(), batch.cases.len());
        assert_eq!(reference.matches("printf(").count(), batch.cases.len());
    }
}
