//! Whole-program generation.
//!
//! A program is a handful of immutable top-level declarations followed by a
//! `main` body of randomly chosen statements. [`ProgramGenerator`] is the
//! generation context: it owns the symbol table for the program being built
//! and threads the RNG through statement and expression generation.

use std::fmt;

use rand::Rng;

use crate::expr::{Expr, ExprConfig, ExprGenerator};
use crate::symbols::{BaseType, Mutability, SymbolTable, SymbolType, choose};

/// Configuration for declaration and statement generation.
///
/// The statement probabilities are laid out as consecutive buckets on
/// `[0, 1)`; whatever is left after `print_probability` goes to array
/// element assignment.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ProgramConfig {
    /// Number of immutable top-level declarations (inclusive range).
    pub const_decls: (usize, usize),
    /// Number of statements in `main` (inclusive range).
    pub statements: (usize, usize),
    /// Size of declared arrays (inclusive range).
    pub array_size: (usize, usize),
    /// Probability that a mutable declaration gets an initializer.
    pub initializer_probability: f64,
    pub array_decl_probability: f64,
    pub scalar_decl_probability: f64,
    pub scalar_assign_probability: f64,
    pub print_probability: f64,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            const_decls: (1, 3),
            statements: (12, 60),
            array_size: (1, 256),
            initializer_probability: 0.5,
            array_decl_probability: 0.05,
            scalar_decl_probability: 0.15,
            scalar_assign_probability: 0.5,
            print_probability: 0.1,
        }
    }
}

/// Initializer attached to a declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Init {
    Scalar(Expr),
    List(Vec<Expr>),
}

/// A scalar or array declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub name: String,
    pub ty: SymbolType,
    pub mutability: Mutability,
    pub init: Option<Init>,
}

impl Decl {
    /// Every initializer expression, in source order.
    #[cfg(test)]
    pub fn init_exprs(&self) -> Vec<&Expr> {
        match &self.init {
            None => Vec::new(),
            Some(Init::Scalar(expr)) => vec![expr],
            Some(Init::List(items)) => items.iter().collect(),
        }
    }
}

impl fmt::Display for Decl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mutability.is_const() {
            f.write_str("const ")?;
        }
        write!(f, "{} {}", self.ty.base, self.name)?;
        if let Some(size) = self.ty.size {
            write!(f, "[{size}]")?;
        }
        match &self.init {
            None => {}
            Some(Init::Scalar(expr)) => write!(f, " = {expr}")?,
            Some(Init::List(items)) => {
                f.write_str(" = {")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("}")?;
            }
        }
        f.write_str(";")
    }
}

/// A statement inside `main`.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Decl(Decl),
    /// `target` is always an [`Expr::Scalar`] or [`Expr::Element`].
    Assign {
        target: Expr,
        value: Expr,
    },
    Print(Expr),
    Empty,
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Decl(decl) => write!(f, "{decl}"),
            Stmt::Assign { target, value } => write!(f, "{target} = {value};"),
            Stmt::Print(expr) => write!(f, "putint({expr});"),
            Stmt::Empty => f.write_str(";"),
        }
    }
}

/// A complete generated program.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub globals: Vec<Decl>,
    pub body: Vec<Stmt>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for decl in &self.globals {
            writeln!(f, "{decl}")?;
        }
        writeln!(f, "int main() {{")?;
        for stmt in &self.body {
            writeln!(f, "  {stmt}")?;
        }
        writeln!(f, "  return 0;")?;
        writeln!(f, "}}")
    }
}

/// Generation context for one program at a time.
pub struct ProgramGenerator<'a, R> {
    rng: &'a mut R,
    program: &'a ProgramConfig,
    expr: &'a ExprConfig,
    table: SymbolTable,
}

impl<'a, R: Rng> ProgramGenerator<'a, R> {
    pub fn new(rng: &'a mut R, program: &'a ProgramConfig, expr: &'a ExprConfig) -> Self {
        Self {
            rng,
            program,
            expr,
            table: SymbolTable::new(),
        }
    }

    /// Symbols declared by the most recently generated program.
    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    /// Generate a fresh program. The symbol table is reset first.
    pub fn generate_program(&mut self) -> Program {
        self.table.reset();

        let (lo, hi) = self.program.const_decls;
        let count = self.rng.gen_range(lo..=hi);
        let globals = (0..count)
            .map(|_| {
                let is_array = self.rng.gen_bool(0.5);
                self.generate_declaration(Mutability::Immutable, is_array)
            })
            .collect();

        let body = self.generate_body();
        Program { globals, body }
    }

    /// Generate the statements of `main`.
    pub fn generate_body(&mut self) -> Vec<Stmt> {
        let (lo, hi) = self.program.statements;
        let count = self.rng.gen_range(lo..=hi);
        (0..count).map(|_| self.generate_statement()).collect()
    }

    /// Declare a new scalar or array and register it once its initializer exists.
    pub fn generate_declaration(&mut self, mutability: Mutability, is_array: bool) -> Decl {
        let base = BaseType::random(self.rng);
        let name = self.table.fresh_name();
        let ty = if is_array {
            let (lo, hi) = self.program.array_size;
            SymbolType::array(base, self.rng.gen_range(lo..=hi))
        } else {
            SymbolType::scalar(base)
        };

        // Constants must be initialized.
        let has_init =
            mutability.is_const() || self.rng.gen_bool(self.program.initializer_probability);
        let init = has_init.then(|| self.generate_initializer(ty, mutability));

        self.table.declare(name.clone(), ty, mutability);
        Decl {
            name,
            ty,
            mutability,
            init,
        }
    }

    fn generate_initializer(&mut self, ty: SymbolType, pool: Mutability) -> Init {
        match ty.size {
            None => Init::Scalar(self.exprs().expression(pool)),
            Some(size) => {
                let count = self.rng.gen_range(1..=size);
                let items = (0..count)
                    .map(|_| self.exprs().initializer_element(pool))
                    .collect();
                Init::List(items)
            }
        }
    }

    fn generate_statement(&mut self) -> Stmt {
        let roll: f64 = self.rng.gen_range(0.0..1.0);
        let config = self.program;
        let array_decl = config.array_decl_probability;
        let scalar_decl = array_decl + config.scalar_decl_probability;
        let scalar_assign = scalar_decl + config.scalar_assign_probability;
        let print = scalar_assign + config.print_probability;

        if roll < array_decl {
            Stmt::Decl(self.generate_declaration(Mutability::Mutable, true))
        } else if roll < scalar_decl {
            Stmt::Decl(self.generate_declaration(Mutability::Mutable, false))
        } else if roll < scalar_assign {
            self.generate_scalar_assign()
                .or_else(|| self.generate_element_assign())
                .unwrap_or(Stmt::Empty)
        } else if roll < print {
            Stmt::Print(self.exprs().expression(Mutability::Mutable))
        } else {
            self.generate_element_assign()
                .or_else(|| self.generate_scalar_assign())
                .unwrap_or(Stmt::Empty)
        }
    }

    fn generate_scalar_assign(&mut self) -> Option<Stmt> {
        let (name, ty) = choose(self.rng, self.table.scalars(Mutability::Mutable))?;
        let target = Expr::Scalar {
            name: name.clone(),
            base: ty.base,
        };
        let value = self.exprs().expression(Mutability::Mutable);
        Some(Stmt::Assign { target, value })
    }

    fn generate_element_assign(&mut self) -> Option<Stmt> {
        let target = self.exprs().array_access(Mutability::Mutable)?;
        let value = self.exprs().expression(Mutability::Mutable);
        Some(Stmt::Assign { target, value })
    }

    fn exprs(&mut self) -> ExprGenerator<'_, R> {
        ExprGenerator::new(&mut *self.rng, self.expr, &self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn generate(seed: u64) -> (Program, SymbolTable) {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let program_config = ProgramConfig::default();
        let expr_config = ExprConfig::default();
        let mut generator = ProgramGenerator::new(&mut rng, &program_config, &expr_config);
        let program = generator.generate_program();
        let table = std::mem::take(&mut generator.table);
        (program, table)
    }

    /// Walk the program in source order, checking every read against the
    /// symbols declared so far.
    fn check_declared_before_use(program: &Program) {
        let mut declared: Vec<(&str, Mutability)> = Vec::new();
        let check = |declared: &[(&str, Mutability)], expr: &Expr, pool: Mutability| {
            for name in expr.referenced_names() {
                let found = declared.iter().find(|(n, _)| *n == name);
                let Some((_, mutability)) = found else {
                    panic!("{name} used before declaration in `{expr}`");
                };
                assert_eq!(*mutability, pool, "{name} read from the wrong pool");
            }
        };

        for decl in &program.globals {
            assert_eq!(decl.mutability, Mutability::Immutable);
            assert!(decl.init.is_some(), "constant {} lacks initializer", decl.name);
            for expr in decl.init_exprs() {
                assert!(
                    !expr.referenced_names().contains(&decl.name.as_str()),
                    "{} initializer references itself",
                    decl.name
                );
                check(&declared, expr, Mutability::Immutable);
            }
            declared.push((decl.name.as_str(), decl.mutability));
        }
        for stmt in &program.body {
            match stmt {
                Stmt::Decl(decl) => {
                    for expr in decl.init_exprs() {
                        check(&declared, expr, Mutability::Mutable);
                    }
                    declared.push((decl.name.as_str(), decl.mutability));
                }
                Stmt::Assign { target, value } => {
                    check(&declared, target, Mutability::Mutable);
                    check(&declared, value, Mutability::Mutable);
                }
                Stmt::Print(expr) => check(&declared, expr, Mutability::Mutable),
                Stmt::Empty => {}
            }
        }
    }

    #[test]
    fn symbols_are_declared_before_use_across_seeds() {
        for seed in 0..300 {
            let (program, _) = generate(seed);
            check_declared_before_use(&program);
        }
    }

    #[test]
    fn program_shape_matches_config() {
        for seed in 0..100 {
            let (program, table) = generate(seed);
            assert!((1..=3).contains(&program.globals.len()));
            assert!((12..=60).contains(&program.body.len()));
            let local_decls = program
                .body
                .iter()
                .filter(|s| matches!(s, Stmt::Decl(_)))
                .count();
            assert_eq!(table.len(), program.globals.len() + local_decls);
        }
    }

    #[test]
    fn array_sizes_and_initializers_fit() {
        for seed in 0..200 {
            let (program, _) = generate(seed);
            let decls = program.globals.iter().chain(program.body.iter().filter_map(
                |s| match s {
                    Stmt::Decl(decl) => Some(decl),
                    _ => None,
                },
            ));
            for decl in decls {
                match (&decl.init, decl.ty.size) {
                    (Some(Init::List(items)), Some(size)) => {
                        assert!((1..=256).contains(&size));
                        assert!(!items.is_empty() && items.len() <= size);
                        for item in items {
                            assert!((1..=2).contains(&item.depth()));
                        }
                    }
                    (Some(Init::Scalar(_)), None) | (None, _) => {}
                    (init, size) => panic!("mismatched init {init:?} for size {size:?}"),
                }
            }
        }
    }

    #[test]
    fn no_assignment_before_first_local_declaration() {
        for seed in 0..200 {
            let (program, _) = generate(seed);
            for stmt in &program.body {
                match stmt {
                    Stmt::Decl(_) => break,
                    Stmt::Assign { .. } => panic!("seed {seed}: assignment before any declaration"),
                    Stmt::Print(_) | Stmt::Empty => {}
                }
            }
        }
    }

    #[test]
    fn assignment_targets_are_mutable() {
        for seed in 0..200 {
            let (program, table) = generate(seed);
            for stmt in &program.body {
                if let Stmt::Assign { target, .. } = stmt {
                    let name = target.referenced_names()[0];
                    let (_, mutability) = table.lookup(name).expect("target declared");
                    assert_eq!(mutability, Mutability::Mutable);
                }
            }
        }
    }

    #[test]
    fn statements_fall_back_to_empty_without_symbols() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(5);
        let program_config = ProgramConfig {
            array_decl_probability: 0.0,
            scalar_decl_probability: 0.0,
            scalar_assign_probability: 0.5,
            print_probability: 0.0,
            ..ProgramConfig::default()
        };
        let expr_config = ExprConfig::default();
        let mut generator = ProgramGenerator::new(&mut rng, &program_config, &expr_config);
        let body = generator.generate_body();
        assert!(body.iter().all(|s| *s == Stmt::Empty));
    }

    #[test]
    fn scalar_bucket_falls_back_to_element_assignment() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(11);
        let program_config = ProgramConfig {
            array_decl_probability: 0.0,
            scalar_decl_probability: 0.0,
            scalar_assign_probability: 1.0,
            print_probability: 0.0,
            ..ProgramConfig::default()
        };
        let expr_config = ExprConfig::default();
        let mut generator = ProgramGenerator::new(&mut rng, &program_config, &expr_config);
        generator.table.declare(
            "v100".into(),
            SymbolType::array(BaseType::Int, 4),
            Mutability::Mutable,
        );
        for _ in 0..20 {
            match generator.generate_statement() {
                Stmt::Assign {
                    target: Expr::Element { array, index, .. },
                    ..
                } => {
                    assert_eq!(array, "v100");
                    assert!(index < 4);
                }
                other => panic!("expected element assignment, got {other:?}"),
            }
        }
    }

    #[test]
    fn rendered_program_layout() {
        let program = Program {
            globals: vec![Decl {
                name: "v1".into(),
                ty: SymbolType::array(BaseType::Float, 2),
                mutability: Mutability::Immutable,
                init: Some(Init::List(vec![Expr::Literal(3), Expr::Literal(-4)])),
            }],
            body: vec![
                Stmt::Empty,
                Stmt::Decl(Decl {
                    name: "v2".into(),
                    ty: SymbolType::scalar(BaseType::Int),
                    mutability: Mutability::Mutable,
                    init: None,
                }),
                Stmt::Assign {
                    target: Expr::Scalar {
                        name: "v2".into(),
                        base: BaseType::Int,
                    },
                    value: Expr::Literal(9),
                },
                Stmt::Print(Expr::Scalar {
                    name: "v2".into(),
                    base: BaseType::Int,
                }),
            ],
        };
        let expected = "const float v1[2] = {3, -4};\n\
                        int main() {\n  \
                          ;\n  \
                          int v2;\n  \
                          v2 = 9;\n  \
                          putint(v2);\n  \
                          return 0;\n\
                        }\n";
        assert_eq!(program.to_string(), expected);
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let (a, _) = generate(1234);
        let (b, _) = generate(1234);
        assert_eq!(a.to_string(), b.to_string());
    }

    #[test]
    fn regenerating_resets_names() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        let program_config = ProgramConfig::default();
        let expr_config = ExprConfig::default();
        let mut generator = ProgramGenerator::new(&mut rng, &program_config, &expr_config);
        generator.generate_program();
        let second = generator.generate_program();
        assert_eq!(second.globals[0].name, "v1");
    }
}
