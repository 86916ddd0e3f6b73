//! Symbol table for one generated program.
//!
//! Declared names are split four ways: mutable scalars, immutable scalars,
//! mutable arrays and immutable arrays. A name lands in exactly one of the
//! four maps when it is declared and stays there until the table is dropped.
//! The table also owns the identifier counter, so names are unique for the
//! lifetime of one program and never reused.

use std::collections::BTreeMap;
use std::fmt;

use rand::Rng;

/// Base type of a scalar or of an array's elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Int,
    Float,
}

impl BaseType {
    /// Pick `int` or `float` with equal probability.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            BaseType::Int
        } else {
            BaseType::Float
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BaseType::Int => "int",
            BaseType::Float => "float",
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a symbol may be the target of an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutability {
    Mutable,
    Immutable,
}

impl Mutability {
    pub fn is_const(&self) -> bool {
        matches!(self, Mutability::Immutable)
    }
}

/// Declared type of a symbol. `size` is `None` for scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolType {
    pub base: BaseType,
    pub size: Option<usize>,
}

impl SymbolType {
    pub fn scalar(base: BaseType) -> Self {
        Self { base, size: None }
    }

    pub fn array(base: BaseType, size: usize) -> Self {
        Self {
            base,
            size: Some(size),
        }
    }

    pub fn is_array(&self) -> bool {
        self.size.is_some()
    }
}

/// The four disjoint symbol maps plus the name counter.
#[derive(Debug, Default)]
pub struct SymbolTable {
    scalars: BTreeMap<String, SymbolType>,
    const_scalars: BTreeMap<String, SymbolType>,
    arrays: BTreeMap<String, SymbolType>,
    const_arrays: BTreeMap<String, SymbolType>,
    counter: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce a fresh identifier (`v1`, `v2`, ...).
    pub fn fresh_name(&mut self) -> String {
        self.counter += 1;
        format!("v{}", self.counter)
    }

    /// Register a declared symbol in the map selected by its shape and mutability.
    pub fn declare(&mut self, name: String, ty: SymbolType, mutability: Mutability) {
        debug_assert!(self.lookup(&name).is_none(), "duplicate symbol {name}");
        self.map_mut(ty.is_array(), mutability).insert(name, ty);
    }

    /// Scalars of the given mutability, in name order.
    pub fn scalars(&self, mutability: Mutability) -> &BTreeMap<String, SymbolType> {
        match mutability {
            Mutability::Mutable => &self.scalars,
            Mutability::Immutable => &self.const_scalars,
        }
    }

    /// Arrays of the given mutability, in name order.
    pub fn arrays(&self, mutability: Mutability) -> &BTreeMap<String, SymbolType> {
        match mutability {
            Mutability::Mutable => &self.arrays,
            Mutability::Immutable => &self.const_arrays,
        }
    }

    /// Find a symbol in any of the four maps.
    pub fn lookup(&self, name: &str) -> Option<(SymbolType, Mutability)> {
        [
            (&self.scalars, Mutability::Mutable),
            (&self.const_scalars, Mutability::Immutable),
            (&self.arrays, Mutability::Mutable),
            (&self.const_arrays, Mutability::Immutable),
        ]
        .into_iter()
        .find_map(|(map, mutability)| map.get(name).map(|ty| (*ty, mutability)))
    }

    /// Total number of declared symbols.
    pub fn len(&self) -> usize {
        self.scalars.len() + self.const_scalars.len() + self.arrays.len() + self.const_arrays.len()
    }

    /// Forget every symbol and restart the name counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn map_mut(
        &mut self,
        is_array: bool,
        mutability: Mutability,
    ) -> &mut BTreeMap<String, SymbolType> {
        match (is_array, mutability) {
            (false, Mutability::Mutable) => &mut self.scalars,
            (false, Mutability::Immutable) => &mut self.const_scalars,
            (true, Mutability::Mutable) => &mut self.arrays,
            (true, Mutability::Immutable) => &mut self.const_arrays,
        }
    }
}

/// Pick a uniformly random entry of a symbol map.
pub fn choose<'m, R: Rng + ?Sized>(
    rng: &mut R,
    map: &'m BTreeMap<String, SymbolType>,
) -> Option<(&'m String, &'m SymbolType)> {
    if map.is_empty() {
        return None;
    }
    map.iter().nth(rng.gen_range(0..map.len()))
}
