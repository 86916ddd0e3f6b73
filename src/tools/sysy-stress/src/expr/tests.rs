use super::*;
use crate::symbols::SymbolType;
use rand::SeedableRng;

fn table_with_everything() -> SymbolTable {
    let mut table = SymbolTable::new();
    let entries = [
        (SymbolType::scalar(BaseType::Int), Mutability::Mutable),
        (SymbolType::scalar(BaseType::Float), Mutability::Mutable),
        (SymbolType::array(BaseType::Int, 3), Mutability::Mutable),
        (SymbolType::scalar(BaseType::Int), Mutability::Immutable),
        (SymbolType::array(BaseType::Float, 1), Mutability::Immutable),
        (SymbolType::array(BaseType::Int, 256), Mutability::Immutable),
    ];
    for (ty, mutability) in entries {
        let name = table.fresh_name();
        table.declare(name, ty, mutability);
    }
    table
}

#[test]
fn literal_leaf_when_table_is_empty() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let config = ExprConfig::default();
    let table = SymbolTable::new();
    let mut generator = ExprGenerator::new(&mut rng, &config, &table);

    for _ in 0..200 {
        match generator.generate(Mutability::Mutable, 0, false) {
            Expr::Literal(value) => assert!((-17..=60).contains(&value)),
            other => panic!("expected literal leaf, got {other:?}"),
        }
    }
}

#[test]
fn generated_depth_is_exact() {
    let config = ExprConfig::default();
    let table = table_with_everything();
    for seed in 0..50 {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut generator = ExprGenerator::new(&mut rng, &config, &table);
        for depth in 0..=5 {
            let expr = generator.generate(Mutability::Mutable, depth, true);
            assert_eq!(expr.depth(), depth, "seed {seed}: {expr}");
        }
    }
}

#[test]
fn const_pool_only_reads_immutable_symbols() {
    let config = ExprConfig::default();
    let table = table_with_everything();
    for seed in 0..200 {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut generator = ExprGenerator::new(&mut rng, &config, &table);
        let expr = generator.expression(Mutability::Immutable);
        for name in expr.referenced_names() {
            let (_, mutability) = table.lookup(name).expect("referenced name is declared");
            assert_eq!(mutability, Mutability::Immutable, "seed {seed}: {expr}");
        }
    }
}

#[test]
fn mutable_pool_only_reads_mutable_symbols() {
    let config = ExprConfig::default();
    let table = table_with_everything();
    for seed in 0..200 {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut generator = ExprGenerator::new(&mut rng, &config, &table);
        let expr = generator.expression(Mutability::Mutable);
        for name in expr.referenced_names() {
            let (_, mutability) = table.lookup(name).expect("referenced name is declared");
            assert_eq!(mutability, Mutability::Mutable, "seed {seed}: {expr}");
        }
    }
}

#[test]
fn element_indices_are_in_bounds() {
    let config = ExprConfig::default();
    let table = table_with_everything();
    for seed in 0..200 {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut generator = ExprGenerator::new(&mut rng, &config, &table);
        let pool = if seed % 2 == 0 {
            Mutability::Mutable
        } else {
            Mutability::Immutable
        };
        let expr = generator.generate(pool, 4, false);
        expr.for_each_leaf(&mut |leaf| {
            if let Expr::Element { array, index, .. } = leaf {
                let (ty, _) = table.lookup(array).unwrap();
                assert!(*index < ty.size.unwrap(), "{array}[{index}] out of bounds");
            }
        });
    }
}

#[test]
fn array_access_none_without_arrays() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(1);
    let config = ExprConfig::default();
    let mut table = SymbolTable::new();
    table.declare(
        "v1".into(),
        SymbolType::scalar(BaseType::Int),
        Mutability::Mutable,
    );
    let mut generator = ExprGenerator::new(&mut rng, &config, &table);
    assert!(generator.array_access(Mutability::Mutable).is_none());
}

#[test]
fn arithmetic_only_without_comparison_flag() {
    let config = ExprConfig::default();
    let table = table_with_everything();
    for seed in 0..100 {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut generator = ExprGenerator::new(&mut rng, &config, &table);
        let expr = generator.generate(Mutability::Mutable, 5, false);
        assert_no_comparison(&expr);
    }
}

fn assert_no_comparison(expr: &Expr) {
    match expr {
        Expr::Binary { op, lhs, rhs, .. } => {
            assert!(!op.is_comparison(), "unexpected {}", op.as_str());
            assert_no_comparison(lhs);
            assert_no_comparison(rhs);
        }
        Expr::Unary { operand, .. } => assert_no_comparison(operand),
        _ => {}
    }
}

fn assert_well_typed_division(expr: &Expr) {
    match expr {
        Expr::Binary { op, lhs, rhs, .. } => {
            if op.is_division() {
                assert_ne!(**rhs, Expr::Literal(0), "literal zero divisor in {expr}");
            }
            if *op == BinaryOp::Rem {
                assert_eq!(lhs.base_type(), BaseType::Int, "float % in {expr}");
                assert_eq!(rhs.base_type(), BaseType::Int, "float % in {expr}");
            }
            assert_well_typed_division(lhs);
            assert_well_typed_division(rhs);
        }
        Expr::Unary { operand, .. } => assert_well_typed_division(operand),
        _ => {}
    }
}

#[test]
fn no_literal_zero_divisor_and_no_float_remainder() {
    let config = ExprConfig::default();
    let table = table_with_everything();
    for seed in 0..300 {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut generator = ExprGenerator::new(&mut rng, &config, &table);
        let expr = generator.generate(Mutability::Mutable, 5, true);
        assert_well_typed_division(&expr);
    }
}

#[test]
fn render_binary_with_parentheses() {
    let expr = Expr::Binary {
        op: BinaryOp::Mul,
        lhs: Box::new(Expr::Binary {
            op: BinaryOp::Add,
            lhs: Box::new(Expr::Literal(1)),
            rhs: Box::new(Expr::Scalar {
                name: "v2".into(),
                base: BaseType::Int,
            }),
            paren_lhs: false,
            paren_rhs: false,
        }),
        rhs: Box::new(Expr::Element {
            array: "v3".into(),
            index: 7,
            base: BaseType::Float,
        }),
        paren_lhs: true,
        paren_rhs: false,
    };
    assert_eq!(expr.to_string(), "(1 + v2) * v3[7]");
    assert_eq!(expr.base_type(), BaseType::Float);
    assert_eq!(expr.referenced_names(), vec!["v2", "v3"]);
}

#[test]
fn render_negated_negative_literal_keeps_tokens_apart() {
    let expr = Expr::Unary {
        op: UnaryOp::Neg,
        operand: Box::new(Expr::Literal(-3)),
        paren: false,
    };
    assert_eq!(expr.to_string(), "- -3");

    let parenthesized = Expr::Unary {
        op: UnaryOp::Not,
        operand: Box::new(Expr::Literal(-3)),
        paren: true,
    };
    assert_eq!(parenthesized.to_string(), "!(-3)");
}

#[test]
fn same_seed_same_expression() {
    let config = ExprConfig::default();
    let table = table_with_everything();
    let mut rng1 = rand::rngs::StdRng::seed_from_u64(99);
    let mut rng2 = rand::rngs::StdRng::seed_from_u64(99);
    let a = ExprGenerator::new(&mut rng1, &config, &table).expression(Mutability::Mutable);
    let b = ExprGenerator::new(&mut rng2, &config, &table).expression(Mutability::Mutable);
    assert_eq!(a, b);
}
