// affine.rs — Affine expressions and their C++ rendering
//
// Affine maps describe loop bounds and array subscripts as expressions over
// dimension operands (loop indices) and symbol operands (loop-invariant
// values). Rendering is structural recursion; the only outside state read is
// the naming table, to resolve operand positions to C++ names.
//
// Preconditions: the operand list passed to the renderer has exactly
//                `num_dims + num_symbols` entries (callers check this with
//                `AffineMap::accepts` and report E0104 otherwise).
// Postconditions: every rendered binary expression is fully parenthesized.
// Failure modes: none; a missing operand renders as an empty name.
// Side effects: none.

use std::fmt::Write as _;
use std::ops::{Add, Mul};

use serde::{Deserialize, Serialize};

use crate::id::ValueId;
use crate::names::NameTable;

// ── Expressions ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffineExpr {
    Dim(u32),
    Symbol(u32),
    Constant(i64),
    Add(Box<AffineExpr>, Box<AffineExpr>),
    Mul(Box<AffineExpr>, Box<AffineExpr>),
    Mod(Box<AffineExpr>, Box<AffineExpr>),
    FloorDiv(Box<AffineExpr>, Box<AffineExpr>),
    CeilDiv(Box<AffineExpr>, Box<AffineExpr>),
}

impl AffineExpr {
    pub fn dim(pos: u32) -> Self {
        AffineExpr::Dim(pos)
    }

    pub fn symbol(pos: u32) -> Self {
        AffineExpr::Symbol(pos)
    }

    pub fn constant(value: i64) -> Self {
        AffineExpr::Constant(value)
    }

    pub fn modulo(self, rhs: AffineExpr) -> Self {
        AffineExpr::Mod(Box::new(self), Box::new(rhs))
    }

    pub fn floor_div(self, rhs: AffineExpr) -> Self {
        AffineExpr::FloorDiv(Box::new(self), Box::new(rhs))
    }

    pub fn ceil_div(self, rhs: AffineExpr) -> Self {
        AffineExpr::CeilDiv(Box::new(self), Box::new(rhs))
    }

    pub fn as_constant(&self) -> Option<i64> {
        match self {
            AffineExpr::Constant(c) => Some(*c),
            _ => None,
        }
    }
}

impl Add for AffineExpr {
    type Output = AffineExpr;

    fn add(self, rhs: AffineExpr) -> AffineExpr {
        AffineExpr::Add(Box::new(self), Box::new(rhs))
    }
}

impl Mul for AffineExpr {
    type Output = AffineExpr;

    fn mul(self, rhs: AffineExpr) -> AffineExpr {
        AffineExpr::Mul(Box::new(self), Box::new(rhs))
    }
}

// ── Maps and sets ───────────────────────────────────────────────────────────

/// A multi-result affine map `(d0, .., dN)[s0, .., sM] -> (e0, .., eK)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffineMap {
    #[serde(default)]
    pub num_dims: u32,
    #[serde(default)]
    pub num_symbols: u32,
    pub results: Vec<AffineExpr>,
}

impl AffineMap {
    pub fn new(num_dims: u32, num_symbols: u32, results: Vec<AffineExpr>) -> Self {
        Self {
            num_dims,
            num_symbols,
            results,
        }
    }

    /// A zero-input map returning one constant.
    pub fn constant(value: i64) -> Self {
        Self::new(0, 0, vec![AffineExpr::Constant(value)])
    }

    /// The identity map over `rank` dimensions.
    pub fn identity(rank: u32) -> Self {
        Self::new(rank, 0, (0..rank).map(AffineExpr::Dim).collect())
    }

    pub fn num_inputs(&self) -> usize {
        (self.num_dims + self.num_symbols) as usize
    }

    /// Whether `operand_count` operands bind every dimension and symbol.
    pub fn accepts(&self, operand_count: usize) -> bool {
        self.num_inputs() == operand_count
    }
}

/// An affine map bundled with the values bound to its inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffineBound {
    pub map: AffineMap,
    #[serde(default)]
    pub operands: Vec<ValueId>,
}

impl AffineBound {
    pub fn new(map: AffineMap, operands: Vec<ValueId>) -> Self {
        Self { map, operands }
    }

    pub fn constant(value: i64) -> Self {
        Self::new(AffineMap::constant(value), Vec::new())
    }
}

/// A conjunction of affine constraints, each either `expr == 0` or `expr >= 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegerSet {
    #[serde(default)]
    pub num_dims: u32,
    #[serde(default)]
    pub num_symbols: u32,
    pub constraints: Vec<AffineExpr>,
    /// Parallel to `constraints`; `true` marks an equality.
    pub eq_flags: Vec<bool>,
}

impl IntegerSet {
    pub fn num_inputs(&self) -> usize {
        (self.num_dims + self.num_symbols) as usize
    }
}

// ── Rendering ───────────────────────────────────────────────────────────────

/// Renders affine expressions whose dimension and symbol positions are bound
/// to `operands` (dimensions first, then symbols).
pub struct AffineRenderer<'a, 'm> {
    names: &'a NameTable<'m>,
    num_dims: usize,
    operands: &'a [ValueId],
}

impl<'a, 'm> AffineRenderer<'a, 'm> {
    pub fn new(names: &'a NameTable<'m>, num_dims: u32, operands: &'a [ValueId]) -> Self {
        Self {
            names,
            num_dims: num_dims as usize,
            operands,
        }
    }

    pub fn for_map(names: &'a NameTable<'m>, map: &AffineMap, operands: &'a [ValueId]) -> Self {
        Self::new(names, map.num_dims, operands)
    }

    pub fn render(&self, expr: &AffineExpr) -> String {
        let mut out = String::new();
        self.write_expr(&mut out, expr);
        out
    }

    /// Render several results as a left-associated chain of `func` calls:
    /// `[a, b, c]` with `max` becomes `max(max(a, b), c)`.
    pub fn render_chain(&self, exprs: &[AffineExpr], func: &str) -> String {
        let mut out = String::new();
        let Some((first, rest)) = exprs.split_first() else {
            return out;
        };
        for _ in rest {
            out.push_str(func);
            out.push('(');
        }
        self.write_expr(&mut out, first);
        for expr in rest {
            out.push_str(", ");
            self.write_expr(&mut out, expr);
            out.push(')');
        }
        out
    }

    /// Render an integer set as ` && `-joined constraints.
    pub fn render_set(&self, set: &IntegerSet) -> String {
        let parts: Vec<String> = set
            .constraints
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let rel = if set.eq_flags.get(i).copied().unwrap_or(false) {
                    "=="
                } else {
                    ">="
                };
                format!("{} {} 0", self.render(c), rel)
            })
            .collect();
        parts.join(" && ")
    }

    fn operand_name(&self, pos: usize) -> String {
        self.operands
            .get(pos)
            .map(|v| self.names.lookup_name(*v))
            .unwrap_or_default()
    }

    fn write_expr(&self, out: &mut String, expr: &AffineExpr) {
        match expr {
            AffineExpr::Dim(pos) => out.push_str(&self.operand_name(*pos as usize)),
            AffineExpr::Symbol(pos) => {
                out.push_str(&self.operand_name(self.num_dims + *pos as usize))
            }
            AffineExpr::Constant(c) => {
                let _ = write!(out, "{}", c);
            }
            AffineExpr::Add(lhs, rhs) => self.write_binary(out, lhs, rhs, "+"),
            AffineExpr::Mul(lhs, rhs) => self.write_binary(out, lhs, rhs, "*"),
            AffineExpr::Mod(lhs, rhs) => self.write_binary(out, lhs, rhs, "%"),
            AffineExpr::FloorDiv(lhs, rhs) => self.write_binary(out, lhs, rhs, "/"),
            AffineExpr::CeilDiv(lhs, rhs) => {
                out.push_str("((");
                self.write_expr(out, lhs);
                out.push_str(" + ");
                self.write_expr(out, rhs);
                out.push_str(" - 1) / ");
                self.write_expr(out, rhs);
                out.push(')');
            }
        }
    }

    fn write_binary(&self, out: &mut String, lhs: &AffineExpr, rhs: &AffineExpr, syntax: &str) {
        out.push('(');
        match (syntax, rhs) {
            // x * -1  ->  (-x)
            ("*", AffineExpr::Constant(-1)) => {
                out.push('-');
                self.write_expr(out, lhs);
                out.push(')');
                return;
            }
            // x + -c  ->  (x - c)
            ("+", AffineExpr::Constant(c)) if *c < 0 => {
                self.write_expr(out, lhs);
                let _ = write!(out, " - {})", c.unsigned_abs());
                return;
            }
            // x + y * -1  ->  (x - y)
            ("+", AffineExpr::Mul(y, factor)) if factor.as_constant() == Some(-1) => {
                self.write_expr(out, lhs);
                out.push_str(" - ");
                self.write_expr(out, y);
                out.push(')');
                return;
            }
            _ => {}
        }
        self.write_expr(out, lhs);
        let _ = write!(out, " {} ", syntax);
        self.write_expr(out, rhs);
        out.push(')');
    }
}
