// ir.rs — Resolved program model consumed by the emitter
//
// A `Module` owns a dense value arena plus an ordered list of functions.
// Scheduling and storage decisions (pipelining, target II, memory kind,
// partitioning, reduction operators) are made upstream and carried here as
// plain attributes; the emitter only reads them. The model derives serde so
// upstream tools can hand it over as JSON (see `pipeline::load_module`).
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use serde::{Deserialize, Serialize};

use crate::affine::{AffineBound, AffineExpr, AffineMap, IntegerSet};
use crate::id::ValueId;

// ── Element types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElemType {
    F16,
    Bf16,
    F32,
    F64,
    Bool,
    /// Native integer used for loop indices.
    Index,
    Int { width: u32, unsigned: bool },
}

impl ElemType {
    pub fn signed(width: u32) -> Self {
        ElemType::Int {
            width,
            unsigned: false,
        }
    }

    pub fn unsigned(width: u32) -> Self {
        ElemType::Int {
            width,
            unsigned: true,
        }
    }

    /// C++ spelling of the type, or `None` when there is no rendering rule.
    pub fn cpp_name(self) -> Option<String> {
        match self {
            ElemType::F32 => Some("float".into()),
            ElemType::F64 => Some("double".into()),
            ElemType::Index => Some("int".into()),
            ElemType::Bool | ElemType::Int { width: 1, .. } => Some("bool".into()),
            ElemType::Int {
                width,
                unsigned: true,
            } => Some(format!("ap_uint<{}>", width)),
            ElemType::Int {
                width,
                unsigned: false,
            } => Some(format!("ap_int<{}>", width)),
            ElemType::F16 | ElemType::Bf16 => None,
        }
    }
}

// ── Shapes ─────────────────────────────────────────────────────────────────

/// Shape of a value. `Ranked` extents are `None` when dynamic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Scalar,
    Ranked(Vec<Option<i64>>),
    Unranked,
}

impl Shape {
    pub fn fixed(dims: &[i64]) -> Self {
        Shape::Ranked(dims.iter().map(|d| Some(*d)).collect())
    }

    pub fn is_shaped(&self) -> bool {
        !matches!(self, Shape::Scalar)
    }

    pub fn rank(&self) -> Option<usize> {
        match self {
            Shape::Scalar => Some(0),
            Shape::Ranked(dims) => Some(dims.len()),
            Shape::Unranked => None,
        }
    }

    /// All extents, if every one of them is static.
    pub fn static_dims(&self) -> Option<Vec<i64>> {
        match self {
            Shape::Scalar => Some(Vec::new()),
            Shape::Ranked(dims) => dims.iter().copied().collect(),
            Shape::Unranked => None,
        }
    }
}

// ── Memory kinds and partitioning ──────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    Bram1p,
    BramS2p,
    BramT2p,
    Uram1p,
    UramS2p,
    UramT2p,
    Dram,
    #[default]
    None,
}

impl MemoryKind {
    pub fn is_on_chip(self) -> bool {
        !matches!(self, MemoryKind::Dram | MemoryKind::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionKind {
    Cyclic,
    Block,
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimPartition {
    pub kind: PartitionKind,
    pub factor: i64,
}

impl DimPartition {
    pub fn cyclic(factor: i64) -> Self {
        Self {
            kind: PartitionKind::Cyclic,
            factor,
        }
    }

    pub fn block(factor: i64) -> Self {
        Self {
            kind: PartitionKind::Block,
            factor,
        }
    }

    pub fn none() -> Self {
        Self {
            kind: PartitionKind::None,
            factor: 1,
        }
    }
}

/// Per-dimension partitioning of an on-chip array.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PartitionLayout {
    pub dims: Vec<DimPartition>,
}

impl PartitionLayout {
    pub fn new(dims: Vec<DimPartition>) -> Self {
        Self { dims }
    }

    /// Derive the layout from an affine layout map whose first `rank` results
    /// give the bank index of each dimension. `d floordiv B` is a block
    /// partition into `ceil(extent / B)` banks; `d mod F` is a cyclic
    /// partition into `F` banks; anything else is unpartitioned.
    pub fn from_layout_map(map: &AffineMap, extents: &[i64]) -> Self {
        let dims = extents
            .iter()
            .enumerate()
            .map(|(dim, extent)| match map.results.get(dim) {
                Some(AffineExpr::FloorDiv(_, rhs)) => match rhs.as_constant() {
                    Some(size) if size > 0 => {
                        DimPartition::block(extent / size + i64::from(extent % size != 0))
                    }
                    _ => DimPartition::none(),
                },
                Some(AffineExpr::Mod(_, rhs)) => match rhs.as_constant() {
                    Some(factor) if factor > 0 => DimPartition::cyclic(factor),
                    _ => DimPartition::none(),
                },
                _ => DimPartition::none(),
            })
            .collect();
        Self { dims }
    }
}

// ── Literals ───────────────────────────────────────────────────────────────

/// Compile-time payload of a constant value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Float(f64),
    Int(i64),
    Bool(bool),
    Dense(Vec<Literal>),
    /// Carried through from upstream but never renderable.
    Str(String),
}

impl Literal {
    /// Text that replaces the value's name at every use site, for scalar
    /// payloads only.
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Literal::Float(v) => Some(float_text(*v)),
            Literal::Int(v) => Some(v.to_string()),
            Literal::Bool(v) => Some(if *v { "1" } else { "0" }.to_string()),
            Literal::Dense(_) | Literal::Str(_) => None,
        }
    }
}

/// Decimal text for finite floats, `INFINITY`/`-INFINITY` by sign otherwise.
/// NaN has no literal of its own and follows its sign bit as well.
pub fn float_text(v: f64) -> String {
    if v.is_finite() {
        format!("{:?}", v)
    } else if v.is_sign_negative() {
        "-INFINITY".to_string()
    } else {
        "INFINITY".to_string()
    }
}

// ── Values ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueInfo {
    pub elem: ElemType,
    pub shape: Shape,
    #[serde(default)]
    pub memory: MemoryKind,
    #[serde(default)]
    pub layout: Option<PartitionLayout>,
    #[serde(default)]
    pub constant: Option<Literal>,
}

impl ValueInfo {
    pub fn scalar(elem: ElemType) -> Self {
        Self {
            elem,
            shape: Shape::Scalar,
            memory: MemoryKind::None,
            layout: None,
            constant: None,
        }
    }

    pub fn array(elem: ElemType, dims: &[i64]) -> Self {
        Self {
            shape: Shape::fixed(dims),
            ..Self::scalar(elem)
        }
    }

    pub fn with_shape(elem: ElemType, shape: Shape) -> Self {
        Self {
            shape,
            ..Self::scalar(elem)
        }
    }

    pub fn in_memory(mut self, memory: MemoryKind) -> Self {
        self.memory = memory;
        self
    }

    pub fn partitioned(mut self, layout: PartitionLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn with_constant(mut self, literal: Literal) -> Self {
        self.constant = Some(literal);
        self
    }

    pub fn is_shaped(&self) -> bool {
        self.shape.is_shaped()
    }

    /// Literal text for scalar constants; `None` for everything else.
    pub fn constant_text(&self) -> Option<String> {
        if self.is_shaped() {
            return None;
        }
        self.constant.as_ref().and_then(Literal::scalar_text)
    }
}

// ── Operation kinds ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReductionKind {
    Add,
    Assign,
    Max,
    Min,
    Multiply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Xor,
    And,
    Or,
    Shl,
    Shr,
}

impl BinaryOp {
    pub fn syntax(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Xor => "^",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Abs,
    Ceil,
    Neg,
    Cos,
    Sin,
    Tanh,
    Sqrt,
    Rsqrt,
    Exp,
    Exp2,
    Log,
    Log2,
    Log10,
}

impl UnaryOp {
    /// Function (or prefix) applied to the parenthesized operand.
    pub fn syntax(self) -> &'static str {
        match self {
            UnaryOp::Abs => "abs",
            UnaryOp::Ceil => "ceil",
            UnaryOp::Neg => "-",
            UnaryOp::Cos => "cos",
            UnaryOp::Sin => "sin",
            UnaryOp::Tanh => "tanh",
            UnaryOp::Sqrt => "sqrt",
            UnaryOp::Rsqrt => "1.0 / sqrt",
            UnaryOp::Exp => "exp",
            UnaryOp::Exp2 => "exp2",
            UnaryOp::Log => "log",
            UnaryOp::Log2 => "log2",
            UnaryOp::Log10 => "log10",
        }
    }
}

/// Float comparison predicates (ordered `o*`, unordered `u*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpFPredicate {
    #[serde(rename = "false")]
    AlwaysFalse,
    Oeq,
    Ogt,
    Oge,
    Olt,
    Ole,
    One,
    Ord,
    Ueq,
    Ugt,
    Uge,
    Ult,
    Ule,
    Une,
    Uno,
    #[serde(rename = "true")]
    AlwaysTrue,
}

impl CmpFPredicate {
    /// C++ operator, or `None` for predicates with no rendering rule.
    pub fn syntax(self) -> Option<&'static str> {
        use CmpFPredicate::*;
        match self {
            Oeq | Ueq => Some("=="),
            One | Une => Some("!="),
            Olt | Ult => Some("<"),
            Ole | Ule => Some("<="),
            Ogt | Ugt => Some(">"),
            Oge | Uge => Some(">="),
            AlwaysFalse | AlwaysTrue | Ord | Uno => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CmpIPredicate {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
    Ult,
    Ule,
    Ugt,
    Uge,
}

impl CmpIPredicate {
    pub fn syntax(self) -> &'static str {
        use CmpIPredicate::*;
        match self {
            Eq => "==",
            Ne => "!=",
            Slt | Ult => "<",
            Sle | Ule => "<=",
            Sgt | Ugt => ">",
            Sge | Uge => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastKind {
    IndexCast,
    UiToFp,
    SiToFp,
    FpToUi,
    FpToSi,
    TruncI,
    ZextI,
    SextI,
}

/// Accelerator IP blocks with a fixed call template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpKind {
    Amax,
    Amin,
    Asum,
    Axpy,
    Dot,
    Gbmv,
    Gemm,
    Gemv,
    Nrm2,
    Scal,
    Swap,
    Symv,
    Trmv,
    Fft,
    PseudoSqrt,
}

/// Operation kind. Operand/result conventions are noted per variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    /// operands: [lower, upper, step]; region 0: body with the induction variable.
    ScfFor,
    /// operands: [condition]; region 0: then, optional region 1: else.
    ScfIf,
    ScfYield,
    /// region 0: body with the induction variable.
    AffineFor {
        lower: AffineBound,
        upper: AffineBound,
        step: i64,
    },
    /// operands: set operands; region 0: then, optional region 1: else.
    AffineIf { set: IntegerSet },
    /// Multi-dimensional reduction nest. `lower`/`upper` carry one result per
    /// dimension; region 0 has one induction variable per dimension.
    AffineParallel {
        lower: AffineBound,
        upper: AffineBound,
        steps: Vec<i64>,
    },
    /// operands: map operands.
    AffineApply { map: AffineMap },
    AffineMax { map: AffineMap },
    AffineMin { map: AffineMap },
    /// operands: [memref, map operands..].
    AffineLoad { map: AffineMap },
    /// operands: [value, memref, map operands..].
    AffineStore { map: AffineMap },
    AffineYield,
    Alloc,
    Alloca,
    Dealloc,
    /// operands: [memref, indices..].
    Load,
    /// operands: [value, memref, indices..].
    Store,
    /// operands: [memref] -> tensor.
    TensorLoad,
    /// operands: [tensor, memref].
    TensorStore,
    TensorToMemref,
    /// operands: [source, index].
    Dim,
    Rank,
    Binary { op: BinaryOp },
    Unary { op: UnaryOp },
    CmpF { predicate: CmpFPredicate },
    CmpI { predicate: CmpIPredicate },
    /// operands: [condition, true_value, false_value].
    Select,
    Constant,
    Cast { kind: CastKind },
    Call { callee: String },
    Return,
    Assign,
    End,
    Ip { kind: IpKind },
    /// Generic IP rendered as a single `__IP__<name>(..)` call.
    IpCall { name: String },
    /// Any operation the emitter has no rule for.
    Other { name: String },
}

impl OpKind {
    /// Dialect-style name used in diagnostics and logs.
    pub fn mnemonic(&self) -> &str {
        match self {
            OpKind::ScfFor => "scf.for",
            OpKind::ScfIf => "scf.if",
            OpKind::ScfYield => "scf.yield",
            OpKind::AffineFor { .. } => "affine.for",
            OpKind::AffineIf { .. } => "affine.if",
            OpKind::AffineParallel { .. } => "affine.parallel",
            OpKind::AffineApply { .. } => "affine.apply",
            OpKind::AffineMax { .. } => "affine.max",
            OpKind::AffineMin { .. } => "affine.min",
            OpKind::AffineLoad { .. } => "affine.load",
            OpKind::AffineStore { .. } => "affine.store",
            OpKind::AffineYield => "affine.yield",
            OpKind::Alloc => "alloc",
            OpKind::Alloca => "alloca",
            OpKind::Dealloc => "dealloc",
            OpKind::Load => "load",
            OpKind::Store => "store",
            OpKind::TensorLoad => "tensor_load",
            OpKind::TensorStore => "tensor_store",
            OpKind::TensorToMemref => "tensor_to_memref",
            OpKind::Dim => "dim",
            OpKind::Rank => "rank",
            OpKind::Binary { .. } => "binary",
            OpKind::Unary { .. } => "unary",
            OpKind::CmpF { .. } => "cmpf",
            OpKind::CmpI { .. } => "cmpi",
            OpKind::Select => "select",
            OpKind::Constant => "constant",
            OpKind::Cast { .. } => "cast",
            OpKind::Call { .. } => "call",
            OpKind::Return => "return",
            OpKind::Assign => "hlscpp.assign",
            OpKind::End => "hlscpp.end",
            OpKind::Ip { .. } => "hlskernel.ip",
            OpKind::IpCall { .. } => "hlskernel.ip_call",
            OpKind::Other { name } => name,
        }
    }
}

// ── Attributes ─────────────────────────────────────────────────────────────

/// Closed attribute schema of a statement/expression node.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpAttrs {
    pub pipeline: bool,
    pub target_ii: Option<i64>,
    pub unroll: bool,
    pub flatten: Option<bool>,
    pub schedule_begin: Option<i64>,
    pub schedule_end: Option<i64>,
    pub iter_latency: Option<i64>,
    pub ii: Option<i64>,
    /// One combining operator per result of a parallel-reduction nest.
    #[serde(rename = "reduction_kind")]
    pub reductions: Vec<ReductionKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FuncAttrs {
    pub top_function: bool,
    pub dataflow: bool,
    pub pipeline: bool,
    pub target_ii: Option<i64>,
    pub latency: Option<i64>,
    pub ii: Option<i64>,
    pub dsp: Option<i64>,
}

// ── Structure ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Op {
    pub kind: OpKind,
    #[serde(default)]
    pub operands: Vec<ValueId>,
    #[serde(default)]
    pub results: Vec<ValueId>,
    #[serde(default)]
    pub attrs: OpAttrs,
    #[serde(default)]
    pub regions: Vec<Block>,
    /// Source line, reported in the trailing `// L<line>` comment.
    #[serde(default)]
    pub line: Option<u32>,
}

impl Op {
    pub fn new(kind: OpKind, operands: Vec<ValueId>, results: Vec<ValueId>) -> Self {
        Self {
            kind,
            operands,
            results,
            attrs: OpAttrs::default(),
            regions: Vec::new(),
            line: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub args: Vec<ValueId>,
    #[serde(default)]
    pub ops: Vec<Op>,
}

impl Block {
    /// The trailing `return` of a function body, if present.
    pub fn return_op(&self) -> Option<&Op> {
        self.ops.last().filter(|op| op.kind == OpKind::Return)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    #[serde(default)]
    pub args: Vec<ValueId>,
    #[serde(default)]
    pub attrs: FuncAttrs,
    /// Exactly one block is well-formed; anything else is a structural error.
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub line: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Module {
    pub values: Vec<ValueInfo>,
    pub functions: Vec<Function>,
}

impl Module {
    pub fn value(&self, id: ValueId) -> &ValueInfo {
        &self.values[id.index()]
    }

    /// Every value referenced by a function that has no arena entry, in
    /// traversal order.
    pub fn dangling_values(&self) -> Vec<ValueId> {
        let mut dangling = Vec::new();
        let mut check = |id: ValueId| {
            if id.index() >= self.values.len() && !dangling.contains(&id) {
                dangling.push(id);
            }
        };
        for func in &self.functions {
            func.args.iter().copied().for_each(&mut check);
            for block in &func.blocks {
                visit_block_values(block, &mut check);
            }
        }
        dangling
    }
}

fn visit_block_values(block: &Block, f: &mut impl FnMut(ValueId)) {
    block.args.iter().copied().for_each(&mut *f);
    for op in &block.ops {
        op.operands.iter().copied().for_each(&mut *f);
        op.results.iter().copied().for_each(&mut *f);
        match &op.kind {
            OpKind::AffineFor { lower, upper, .. } | OpKind::AffineParallel { lower, upper, .. } => {
                lower.operands.iter().copied().for_each(&mut *f);
                upper.operands.iter().copied().for_each(&mut *f);
            }
            _ => {}
        }
        for region in &op.regions {
            visit_block_values(region, f);
        }
    }
}
