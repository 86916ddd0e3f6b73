//! Depth-bounded expression generation.
//!
//! Expressions are built as an [`Expr`] tree and rendered to SysY text through
//! `Display`. Every leaf is a literal, a scalar reference or an array element
//! with a statically in-bounds index. The symbol pool a generator draws from is
//! fixed by a [`Mutability`]: an expression built for an immutable declaration
//! only ever reads immutable symbols.

use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::symbols::{BaseType, Mutability, SymbolTable, choose};

/// Configuration for expression generation.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ExprConfig {
    /// Depth of a free-standing expression (inclusive range).
    pub depth: (usize, usize),
    /// Depth of each element of an array initializer list (inclusive range).
    pub init_depth: (usize, usize),
    /// Range of integer literals at the leaves (inclusive).
    pub literal_range: (i64, i64),
    /// Probability that a leaf reads an array element (when one exists).
    pub leaf_array_probability: f64,
    /// Probability that a non-array leaf reads a scalar (when one exists).
    pub leaf_scalar_probability: f64,
    /// Probability that an inner node is a unary operator.
    pub unary_probability: f64,
    /// Probability that an operand gets explicit parentheses.
    pub paren_probability: f64,
    /// Whether comparison and logical operators may appear.
    pub allow_comparison: bool,
}

impl Default for ExprConfig {
    fn default() -> Self {
        Self {
            depth: (1, 5),
            init_depth: (1, 2),
            literal_range: (-17, 60),
            leaf_array_probability: 0.4,
            leaf_scalar_probability: 0.571428,
            unary_probability: 0.1,
            paren_probability: 0.2,
            allow_comparison: false,
        }
    }
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
        }
    }
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Ne,
    Eq,
    Ge,
    Le,
    Lt,
    Gt,
    And,
    Or,
}

/// Operators allowed in every expression.
pub const ARITHMETIC_OPS: &[BinaryOp] = &[
    BinaryOp::Add,
    BinaryOp::Sub,
    BinaryOp::Mul,
    BinaryOp::Div,
    BinaryOp::Rem,
];

/// Arithmetic plus comparison and logical operators.
pub const ALL_OPS: &[BinaryOp] = &[
    BinaryOp::Add,
    BinaryOp::Sub,
    BinaryOp::Mul,
    BinaryOp::Div,
    BinaryOp::Rem,
    BinaryOp::Ne,
    BinaryOp::Eq,
    BinaryOp::Ge,
    BinaryOp::Le,
    BinaryOp::Lt,
    BinaryOp::Gt,
    BinaryOp::And,
    BinaryOp::Or,
];

/// `%` replacements when an operand is a float.
const FLOAT_SAFE_OPS: &[BinaryOp] = &[BinaryOp::Add, BinaryOp::Sub, BinaryOp::Mul, BinaryOp::Div];

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Ne => "!=",
            BinaryOp::Eq => "==",
            BinaryOp::Ge => ">=",
            BinaryOp::Le => "<=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Comparison and logical operators always yield an `int`.
    pub fn is_comparison(&self) -> bool {
        !ARITHMETIC_OPS.contains(self)
    }

    pub fn is_division(&self) -> bool {
        matches!(self, BinaryOp::Div | BinaryOp::Rem)
    }
}

/// A generated expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(i64),
    Scalar {
        name: String,
        base: BaseType,
    },
    Element {
        array: String,
        index: usize,
        base: BaseType,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        paren: bool,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        paren_lhs: bool,
        paren_rhs: bool,
    },
}

impl Expr {
    /// Static type of the expression.
    pub fn base_type(&self) -> BaseType {
        match self {
            Expr::Literal(_) => BaseType::Int,
            Expr::Scalar { base, .. } | Expr::Element { base, .. } => *base,
            Expr::Unary {
                op: UnaryOp::Not, ..
            } => BaseType::Int,
            Expr::Unary { operand, .. } => operand.base_type(),
            Expr::Binary { op, lhs, rhs, .. } => {
                if op.is_comparison() {
                    BaseType::Int
                } else if lhs.base_type() == BaseType::Float || rhs.base_type() == BaseType::Float
                {
                    BaseType::Float
                } else {
                    BaseType::Int
                }
            }
        }
    }

    /// Operator nesting depth; leaves have depth 0.
    #[cfg(test)]
    pub fn depth(&self) -> usize {
        match self {
            Expr::Literal(_) | Expr::Scalar { .. } | Expr::Element { .. } => 0,
            Expr::Unary { operand, .. } => 1 + operand.depth(),
            Expr::Binary { lhs, rhs, .. } => 1 + lhs.depth().max(rhs.depth()),
        }
    }

    /// Visit every leaf from left to right.
    #[cfg(test)]
    pub fn for_each_leaf<'e>(&'e self, f: &mut impl FnMut(&'e Expr)) {
        match self {
            Expr::Unary { operand, .. } => operand.for_each_leaf(f),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.for_each_leaf(f);
                rhs.for_each_leaf(f);
            }
            leaf => f(leaf),
        }
    }

    /// Names of every scalar and array read by the expression.
    #[cfg(test)]
    pub fn referenced_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.for_each_leaf(&mut |leaf| match leaf {
            Expr::Scalar { name, .. } => names.push(name.as_str()),
            Expr::Element { array, .. } => names.push(array.as_str()),
            _ => {}
        });
        names
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(value) => write!(f, "{value}"),
            Expr::Scalar { name, .. } => f.write_str(name),
            Expr::Element { array, index, .. } => write!(f, "{array}[{index}]"),
            Expr::Unary { op, operand, paren } => {
                f.write_str(op.as_str())?;
                if *paren {
                    write!(f, "({operand})")
                } else {
                    let text = operand.to_string();
                    // "- -3" must not lex as "--3"
                    if *op == UnaryOp::Neg && text.starts_with('-') {
                        f.write_str(" ")?;
                    }
                    f.write_str(&text)
                }
            }
            Expr::Binary {
                op,
                lhs,
                rhs,
                paren_lhs,
                paren_rhs,
            } => {
                write_operand(f, lhs, *paren_lhs)?;
                write!(f, " {} ", op.as_str())?;
                write_operand(f, rhs, *paren_rhs)
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &Expr, paren: bool) -> fmt::Result {
    if paren {
        write!(f, "({expr})")
    } else {
        write!(f, "{expr}")
    }
}

/// Expression generator over a fixed symbol table.
pub struct ExprGenerator<'a, R> {
    rng: &'a mut R,
    config: &'a ExprConfig,
    table: &'a SymbolTable,
}

impl<'a, R: Rng> ExprGenerator<'a, R> {
    pub fn new(rng: &'a mut R, config: &'a ExprConfig, table: &'a SymbolTable) -> Self {
        Self { rng, config, table }
    }

    /// Generate an expression of random depth drawn from the configured range.
    pub fn expression(&mut self, pool: Mutability) -> Expr {
        let depth = self.rng.gen_range(self.config.depth.0..=self.config.depth.1);
        self.generate(pool, depth, self.config.allow_comparison)
    }

    /// Generate one element of an array initializer list.
    pub fn initializer_element(&mut self, pool: Mutability) -> Expr {
        let depth = self
            .rng
            .gen_range(self.config.init_depth.0..=self.config.init_depth.1);
        self.generate(pool, depth, self.config.allow_comparison)
    }

    /// Generate an expression of exactly `depth` operator levels whose leaves
    /// only read symbols from `pool`.
    pub fn generate(&mut self, pool: Mutability, depth: usize, allow_comparison: bool) -> Expr {
        if depth == 0 {
            return self.leaf(pool);
        }

        if self.rng.gen_bool(self.config.unary_probability) {
            let op = if self.rng.gen_bool(0.5) {
                UnaryOp::Not
            } else {
                UnaryOp::Neg
            };
            let paren = self.rng.gen_bool(self.config.paren_probability);
            let operand = self.generate(pool, depth - 1, allow_comparison);
            return Expr::Unary {
                op,
                operand: Box::new(operand),
                paren,
            };
        }

        let ops = if allow_comparison {
            ALL_OPS
        } else {
            ARITHMETIC_OPS
        };
        let mut op = *ops.choose(self.rng).unwrap_or(&BinaryOp::Add);
        let paren_lhs = self.rng.gen_bool(self.config.paren_probability);
        let paren_rhs = self.rng.gen_bool(self.config.paren_probability);
        let lhs = self.generate(pool, depth - 1, allow_comparison);
        let mut rhs = self.generate(pool, depth - 1, allow_comparison);

        if op == BinaryOp::Rem
            && (lhs.base_type() == BaseType::Float || rhs.base_type() == BaseType::Float)
        {
            op = *FLOAT_SAFE_OPS.choose(self.rng).unwrap_or(&BinaryOp::Add);
        }
        if op.is_division() && rhs == Expr::Literal(0) {
            rhs = Expr::Literal(1);
        }

        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            paren_lhs,
            paren_rhs,
        }
    }

    /// Read a random element of a random array from `pool`, if any exists.
    pub fn array_access(&mut self, pool: Mutability) -> Option<Expr> {
        let (name, ty) = choose(self.rng, self.table.arrays(pool))?;
        let size = ty.size?;
        let index = self.rng.gen_range(0..size);
        Some(Expr::Element {
            array: name.clone(),
            index,
            base: ty.base,
        })
    }

    fn leaf(&mut self, pool: Mutability) -> Expr {
        if self.rng.gen_bool(self.config.leaf_array_probability)
            && let Some(element) = self.array_access(pool)
        {
            return element;
        }
        if self.rng.gen_bool(self.config.leaf_scalar_probability)
            && let Some((name, ty)) = choose(self.rng, self.table.scalars(pool))
        {
            return Expr::Scalar {
                name: name.clone(),
                base: ty.base,
            };
        }
        let (lo, hi) = self.config.literal_range;
        Expr::Literal(self.rng.gen_range(lo..=hi))
    }
}

#[cfg(test)]
mod tests;
