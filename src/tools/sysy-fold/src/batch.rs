// batch.rs
//! Paired arithmetic/comparison cases sharing one runtime input.
//!
//! Each drawn case is emitted twice, once with the input on the left of the
//! arithmetic operator and once on the right, so that a constant folder that
//! only handles one operand order shows up as a divergence.

use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;

/// Shape of one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchConfig {
    /// Cases drawn per batch; each produces two expressions.
    pub cases: usize,
    /// Range of both constants (inclusive).
    pub constant_range: (i32, i32),
    /// Range of the input value (inclusive); zero is never drawn.
    pub input_range: (i32, i32),
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            cases: 20,
            constant_range: (-10, 50),
            input_range: (-10000, 10000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

pub const ARITH_OPS: &[ArithOp] = &[
    ArithOp::Add,
    ArithOp::Sub,
    ArithOp::Mul,
    ArithOp::Div,
    ArithOp::Rem,
];

impl ArithOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Rem => "%",
        }
    }

    pub fn is_division(&self) -> bool {
        matches!(self, ArithOp::Div | ArithOp::Rem)
    }

    /// C semantics on `int`: wrapping, division truncates toward zero and the
    /// remainder takes the sign of the dividend. `None` on a zero divisor.
    pub fn apply(&self, lhs: i32, rhs: i32) -> Option<i32> {
        match self {
            ArithOp::Add => Some(lhs.wrapping_add(rhs)),
            ArithOp::Sub => Some(lhs.wrapping_sub(rhs)),
            ArithOp::Mul => Some(lhs.wrapping_mul(rhs)),
            ArithOp::Div => (rhs != 0).then(|| lhs.wrapping_div(rhs)),
            ArithOp::Rem => (rhs != 0).then(|| lhs.wrapping_rem(rhs)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Gt,
    Eq,
    Le,
    Ge,
}

pub const CMP_OPS: &[CmpOp] = &[CmpOp::Lt, CmpOp::Gt, CmpOp::Eq, CmpOp::Le, CmpOp::Ge];

impl CmpOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Gt => ">",
            CmpOp::Eq => "==",
            CmpOp::Le => "<=",
            CmpOp::Ge => ">=",
        }
    }

    pub fn apply(&self, lhs: i32, rhs: i32) -> i32 {
        let holds = match self {
            CmpOp::Lt => lhs < rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Eq => lhs == rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Ge => lhs >= rhs,
        };
        holds as i32
    }
}

/// Which side of the arithmetic operator the input `x` sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// `x OP c1 COMP c2`
    InputFirst,
    /// `c1 OP x COMP c2`
    ConstantFirst,
}

/// One expression of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Case {
    pub op: ArithOp,
    pub cmp: CmpOp,
    pub c1: i32,
    pub c2: i32,
    pub order: Order,
}

impl Case {
    /// Value the expression must print for input `x`, or `None` when it
    /// divides by zero.
    pub fn evaluate(&self, x: i32) -> Option<i32> {
        let lhs = match self.order {
            Order::InputFirst => self.op.apply(x, self.c1)?,
            Order::ConstantFirst => self.op.apply(self.c1, x)?,
        };
        Some(self.cmp.apply(lhs, self.c2))
    }
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (op, cmp) = (self.op.as_str(), self.cmp.as_str());
        match self.order {
            Order::InputFirst => write!(f, "x {op} {} {cmp} {}", self.c1, self.c2),
            Order::ConstantFirst => write!(f, "{} {op} x {cmp} {}", self.c1, self.c2),
        }
    }
}

/// The expressions of one oracle round plus the input they all read.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub cases: Vec<Case>,
    pub input: i32,
}

impl Batch {
    /// Draw a batch: `config.cases` iterations of two paired expressions,
    /// then the shared input.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, config: &BatchConfig) -> Self {
        let (lo, hi) = config.constant_range;
        let mut cases = Vec::with_capacity(config.cases * 2);
        for _ in 0..config.cases {
            let mut c1 = rng.gen_range(lo..=hi);
            let c2 = rng.gen_range(lo..=hi);
            let op = *ARITH_OPS.choose(rng).unwrap_or(&ArithOp::Add);
            let cmp = *CMP_OPS.choose(rng).unwrap_or(&CmpOp::Lt);
            if op.is_division() && c1 == 0 {
                c1 = 1;
            }
            for order in [Order::InputFirst, Order::ConstantFirst] {
                cases.push(Case {
                    op,
                    cmp,
                    c1,
                    c2,
                    order,
                });
            }
        }

        let (lo, hi) = config.input_range;
        let input = loop {
            let x = rng.gen_range(lo..=hi);
            if x != 0 {
                break x;
            }
        };

        Self { cases, input }
    }

    /// Bytes piped to both programs' stdin.
    pub fn input_bytes(&self) -> Vec<u8> {
        format!("{}\n", self.input).into_bytes()
    }

    pub fn expressions(&self) -> impl Iterator<Item = String> + '_ {
        self.cases.iter().map(Case::to_string)
    }

    /// One expression per line, as archived next to a divergence.
    pub fn listing(&self) -> String {
        self.expressions().collect::<Vec<_>>().join("\n")
    }

    /// Output a correct toolchain prints for this batch, or `None` if some
    /// expression divides by zero.
    pub fn expected_output(&self) -> Option<String> {
        let mut out = String::new();
        for case in &self.cases {
            out.push_str(&case.evaluate(self.input)?.to_string());
            out.push('\n');
        }
        Some(out)
    }
}
