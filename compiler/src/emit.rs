// emit.rs — HLS C++ emission: context, value rendering, module orchestration
//
// Renders a resolved `ir::Module` as Vivado HLS C++ in one deterministic pass.
// All mutable state (naming table, indent depth, diagnostics) lives in one
// `EmitCtx` created per pass; statement, pragma, and IP rules extend it from
// `stmt.rs`, `pragma.rs`, and `ip.rs`.
//
// Preconditions: every `ValueId` referenced by a function indexes the value
//                arena (checked up front, E0106 otherwise).
// Postconditions: returns `EmitResult` with the generated source and every
//                 diagnostic raised during the pass.
// Failure modes: diagnosable problems are recorded and emission continues;
//                the pass never aborts midway.
// Side effects: none.

use std::fmt::Write as _;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;

use tracing::{debug, trace};

use crate::diag::{codes, DiagCode, DiagLevel, Diagnostic, Origin};
use crate::error::EmitError;
use crate::id::ValueId;
use crate::ir::{Block, Function, Module, Op, OpAttrs, OpKind, ValueInfo};
use crate::names::{NameError, NameTable};

// ── Public types ────────────────────────────────────────────────────────────

/// Fixed text written before the first function.
pub const PROLOGUE: &str = "
//===------------------------------------------------------------*- C++ -*-===//
//
// Automatically generated file for High-level Synthesis (HLS).
//
//===----------------------------------------------------------------------===//

#include <algorithm>
#include <ap_axi_sdata.h>
#include <ap_fixed.h>
#include <ap_int.h>
#include <hls_math.h>
#include <hls_stream.h>
#include <math.h>
#include <stdint.h>
#include <xf_blas.hpp>

using namespace std;
using namespace xf::blas;

";

const STATIC_SHAPE_HINT: &str = "resolve every extent to a constant before emission";

#[derive(Debug)]
pub struct EmitResult {
    pub generated: GeneratedCode,
    pub diagnostics: Vec<Diagnostic>,
}

impl EmitResult {
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

#[derive(Debug)]
pub struct GeneratedCode {
    pub cpp_source: String,
}

#[derive(Debug, Clone, Default)]
pub struct EmitOptions {
    /// Extra headers included after the fixed prologue.
    pub include_paths: Vec<PathBuf>,
}

// ── Public entry points ─────────────────────────────────────────────────────

/// Emit `module` into `sink`. Succeeds (returning any warnings) only when the
/// pass raised no error. Text already appended to `sink` is left in place on
/// failure; callers decide whether to discard it.
pub fn emit(module: &Module, sink: &mut String) -> Result<Vec<Diagnostic>, EmitError> {
    let result = emit_with_options(module, &EmitOptions::default());
    sink.push_str(&result.generated.cpp_source);
    if result.has_errors() {
        return Err(EmitError {
            error_count: result.error_count(),
            diagnostics: result.diagnostics,
        });
    }
    Ok(result.diagnostics)
}

#[tracing::instrument(level = "debug", skip_all, fields(functions = module.functions.len()))]
pub fn emit_with_options(module: &Module, options: &EmitOptions) -> EmitResult {
    let mut ctx = EmitCtx::new(module);
    let dangling = module.dangling_values();
    if dangling.is_empty() {
        ctx.emit_module(options);
    } else {
        for id in dangling {
            ctx.diagnostics.push(
                Diagnostic::new(
                    DiagLevel::Error,
                    Origin::default(),
                    format!("value %{} is referenced but not defined in the value table", id.0),
                )
                .with_code(codes::E0106),
            );
        }
    }
    debug!(
        diagnostics = ctx.diagnostics.len(),
        bytes = ctx.out.len(),
        "emission complete"
    );
    ctx.build_result()
}

// ── Emission context ────────────────────────────────────────────────────────

/// Where a block sits; yields consult this to pick their rendering.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Parent<'m> {
    Function,
    Op(&'m Op),
}

pub(crate) struct EmitCtx<'m> {
    pub(crate) module: &'m Module,
    pub(crate) names: NameTable<'m>,
    pub(crate) out: String,
    pub(crate) diagnostics: Vec<Diagnostic>,
    depth: usize,
    function: Option<&'m str>,
}

/// Indent guard: nested emission happens through it and the depth is
/// restored when it goes out of scope, on every exit path.
pub(crate) struct Indented<'c, 'm> {
    ctx: &'c mut EmitCtx<'m>,
    levels: usize,
}

impl<'m> Deref for Indented<'_, 'm> {
    type Target = EmitCtx<'m>;

    fn deref(&self) -> &EmitCtx<'m> {
        self.ctx
    }
}

impl<'m> DerefMut for Indented<'_, 'm> {
    fn deref_mut(&mut self) -> &mut EmitCtx<'m> {
        self.ctx
    }
}

impl Drop for Indented<'_, '_> {
    fn drop(&mut self) {
        self.ctx.depth -= self.levels;
    }
}

impl<'m> EmitCtx<'m> {
    pub(crate) fn new(module: &'m Module) -> Self {
        Self {
            module,
            names: NameTable::new(&module.values),
            out: String::new(),
            diagnostics: Vec::new(),
            depth: 0,
            function: None,
        }
    }

    fn build_result(self) -> EmitResult {
        EmitResult {
            generated: GeneratedCode {
                cpp_source: self.out,
            },
            diagnostics: self.diagnostics,
        }
    }

    // ── Indentation ─────────────────────────────────────────────────────

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn indent(&mut self) {
        self.indent_at(self.depth);
    }

    pub(crate) fn indent_at(&mut self, depth: usize) {
        for _ in 0..depth {
            self.out.push_str("  ");
        }
    }

    /// Enter `levels` nested indentation levels until the guard drops.
    pub(crate) fn nest(&mut self, levels: usize) -> Indented<'_, 'm> {
        self.depth += levels;
        Indented { ctx: self, levels }
    }

    // ── Diagnostics ─────────────────────────────────────────────────────

    fn origin(&self, op: Option<&Op>) -> Origin {
        Origin {
            function: self.function.map(str::to_string),
            op: op.map(|op| op.kind.mnemonic().to_string()),
            line: op.and_then(|op| op.line),
        }
    }

    pub(crate) fn error(&mut self, op: Option<&Op>, code: DiagCode, message: impl Into<String>) {
        let diag = Diagnostic::new(DiagLevel::Error, self.origin(op), message).with_code(code);
        trace!(%diag, "diagnostic");
        self.diagnostics.push(diag);
    }

    pub(crate) fn error_with_hint(
        &mut self,
        op: Option<&Op>,
        code: DiagCode,
        message: impl Into<String>,
        hint: &str,
    ) {
        let diag = Diagnostic::new(DiagLevel::Error, self.origin(op), message)
            .with_code(code)
            .with_hint(hint);
        trace!(%diag, "diagnostic");
        self.diagnostics.push(diag);
    }

    pub(crate) fn warning(&mut self, op: Option<&Op>, code: DiagCode, message: impl Into<String>) {
        let diag = Diagnostic::new(DiagLevel::Warning, self.origin(op), message).with_code(code);
        tracing::warn!(%diag, "diagnostic");
        self.diagnostics.push(diag);
    }

    // ── Values ──────────────────────────────────────────────────────────

    pub(crate) fn info(&self, id: ValueId) -> &'m ValueInfo {
        self.module.value(id)
    }

    /// Declared, aliased, or a constant scalar rendered by literal.
    pub(crate) fn is_bound(&self, id: ValueId) -> bool {
        self.names.is_declared(id) || self.info(id).constant_text().is_some()
    }

    fn declare(&mut self, id: ValueId, is_ptr: bool, op: Option<&Op>) -> String {
        match self.names.declare(id, is_ptr) {
            Ok(name) => name,
            Err(err) => {
                self.report_name_error(op, err);
                self.names.lookup_name(id)
            }
        }
    }

    pub(crate) fn report_name_error(&mut self, op: Option<&Op>, err: NameError) {
        self.error(op, codes::E0103, err.to_string());
    }

    fn emit_type_prefix(&mut self, id: ValueId, op: Option<&Op>) {
        let elem = self.info(id).elem;
        match elem.cpp_name() {
            Some(ty) => {
                self.out.push_str(&ty);
                self.out.push(' ');
            }
            None => self.error(
                op,
                codes::E0300,
                format!("element type {:?} of value %{} has no C++ rendering", elem, id.0),
            ),
        }
    }

    /// Write a use of `id`, declaring it with its type on first use. `rank`
    /// appends `[idx0]..[idx<rank-1>]` for accesses inside a nested index loop.
    pub(crate) fn emit_value(&mut self, id: ValueId, rank: usize, op: Option<&Op>) {
        if self.is_bound(id) {
            let name = self.names.lookup_name(id);
            self.out.push_str(&name);
        } else {
            self.emit_type_prefix(id, op);
            let name = self.declare(id, false, op);
            self.out.push_str(&name);
        }
        for i in 0..rank {
            let _ = write!(self.out, "[idx{}]", i);
        }
    }

    /// Like `emit_value`, but a fresh declaration is a pointer (`*valN`).
    pub(crate) fn emit_ptr_value(&mut self, id: ValueId, op: Option<&Op>) {
        if self.is_bound(id) {
            let name = self.names.lookup_name(id);
            self.out.push_str(&name);
            return;
        }
        self.emit_type_prefix(id, op);
        let name = self.declare(id, true, op);
        self.out.push_str(&name);
    }

    /// `type valN[d0][d1]..`; a non-static shape is reported and declared as
    /// a pointer instead.
    pub(crate) fn emit_array_decl(&mut self, id: ValueId, op: Option<&Op>) {
        let info = self.info(id);
        match info.shape.static_dims() {
            Some(dims) => {
                self.emit_value(id, 0, op);
                for extent in dims {
                    let _ = write!(self.out, "[{}]", extent);
                }
            }
            None => {
                self.error_with_hint(
                    op,
                    codes::E0200,
                    format!("value %{} is unranked or has a dynamic shape", id.0),
                    STATIC_SHAPE_HINT,
                );
                self.emit_ptr_value(id, op);
            }
        }
    }

    /// Array declaration for shaped values, plain declaration otherwise.
    pub(crate) fn emit_decl(&mut self, id: ValueId, op: Option<&Op>) {
        if self.info(id).is_shaped() {
            self.emit_array_decl(id, op);
        } else {
            self.emit_value(id, 0, op);
        }
    }

    /// Declare every not-yet-bound result of `op` on its own line.
    pub(crate) fn predeclare_results(&mut self, op: &Op) {
        for &result in &op.results {
            if !self.is_bound(result) {
                self.indent();
                self.emit_decl(result, Some(op));
                self.out.push_str(";\n");
            }
        }
    }

    // ── Trailing info comment ───────────────────────────────────────────

    pub(crate) fn emit_info(&mut self, line: Option<u32>, attrs: Option<&OpAttrs>) {
        self.out.push_str("\t//");
        if let Some(line) = line {
            let _ = write!(self.out, " L{}", line);
        }
        if let Some(attrs) = attrs {
            if let Some(begin) = attrs.schedule_begin {
                let _ = write!(self.out, ", S[{}", begin);
            }
            if let Some(end) = attrs.schedule_end {
                let _ = write!(self.out, ",{})", end);
            }
            if let Some(latency) = attrs.iter_latency {
                let _ = write!(self.out, ", latency={}", latency);
            }
            if let Some(ii) = attrs.ii {
                let _ = write!(self.out, ", II={}", ii);
            }
        }
        self.out.push('\n');
    }

    pub(crate) fn emit_op_info(&mut self, op: &Op) {
        self.emit_info(op.line, Some(&op.attrs));
    }

    // ── Nested index loops ──────────────────────────────────────────────

    /// Run `body` once per element of `target`: for shaped targets, declare
    /// `target` if needed and wrap `body` in one `idx<i>` loop per dimension.
    /// `body` receives the rank to index with (0 for scalars).
    pub(crate) fn elementwise(
        &mut self,
        target: ValueId,
        op: &Op,
        body: impl FnOnce(&mut EmitCtx<'m>, usize),
    ) {
        let dims = self.loop_extents(target, op);
        let base = self.depth;
        for (i, extent) in dims.iter().enumerate() {
            self.indent_at(base + i);
            let _ = writeln!(
                self.out,
                "for (int idx{i} = 0; idx{i} < {extent}; ++idx{i}) {{",
                i = i,
                extent = extent
            );
        }
        {
            let mut inner = self.nest(dims.len());
            body(&mut *inner, dims.len());
        }
        for i in (0..dims.len()).rev() {
            self.indent_at(base + i);
            self.out.push_str("}\n");
        }
    }

    fn loop_extents(&mut self, target: ValueId, op: &Op) -> Vec<i64> {
        let info = self.info(target);
        if !info.is_shaped() {
            return Vec::new();
        }
        let Some(dims) = info.shape.static_dims() else {
            self.error_with_hint(
                Some(op),
                codes::E0200,
                format!("value %{} is unranked or has a dynamic shape", target.0),
                STATIC_SHAPE_HINT,
            );
            return Vec::new();
        };
        if !self.is_bound(target) {
            self.indent();
            self.emit_array_decl(target, Some(op));
            self.out.push_str(";\n");
        }
        dims
    }

    // ── Blocks ──────────────────────────────────────────────────────────

    pub(crate) fn emit_block(&mut self, block: &'m Block, parent: Parent<'m>) {
        for op in &block.ops {
            trace!(op = op.kind.mnemonic(), line = ?op.line, "dispatch");
            if self.check_arity(op) {
                self.emit_op(op, parent);
            }
        }
    }

    /// Operand, result, and region counts every rule relies on.
    fn check_arity(&mut self, op: &Op) -> bool {
        let (operands, results, regions) = match &op.kind {
            OpKind::ScfFor => (3, 0, 1),
            OpKind::ScfIf => (1, 0, 1),
            OpKind::AffineFor { .. } | OpKind::AffineIf { .. } | OpKind::AffineParallel { .. } => {
                (0, 0, 1)
            }
            OpKind::AffineApply { .. }
            | OpKind::AffineMax { .. }
            | OpKind::AffineMin { .. }
            | OpKind::Alloc
            | OpKind::Alloca
            | OpKind::Constant => (0, 1, 0),
            OpKind::AffineLoad { .. }
            | OpKind::Load
            | OpKind::TensorLoad
            | OpKind::TensorToMemref
            | OpKind::Rank
            | OpKind::Unary { .. }
            | OpKind::Cast { .. }
            | OpKind::Assign => (1, 1, 0),
            OpKind::AffineStore { .. } | OpKind::Store | OpKind::TensorStore => (2, 0, 0),
            OpKind::Dim | OpKind::Binary { .. } | OpKind::CmpF { .. } | OpKind::CmpI { .. } => {
                (2, 1, 0)
            }
            OpKind::Select => (3, 1, 0),
            OpKind::ScfYield
            | OpKind::AffineYield
            | OpKind::Dealloc
            | OpKind::Call { .. }
            | OpKind::Return
            | OpKind::End
            | OpKind::Ip { .. }
            | OpKind::IpCall { .. }
            | OpKind::Other { .. } => (0, 0, 0),
        };
        if op.operands.len() < operands || op.results.len() < results || op.regions.len() < regions
        {
            self.error(
                Some(op),
                codes::E0105,
                format!(
                    "expected at least {} operand(s), {} result(s), {} region(s); found {}, {}, {}",
                    operands,
                    results,
                    regions,
                    op.operands.len(),
                    op.results.len(),
                    op.regions.len()
                ),
            );
            return false;
        }
        true
    }

    fn emit_op(&mut self, op: &'m Op, parent: Parent<'m>) {
        match &op.kind {
            OpKind::ScfFor => self.emit_scf_for(op),
            OpKind::ScfIf => self.emit_if(op, None),
            OpKind::AffineIf { set } => self.emit_if(op, Some(set)),
            OpKind::ScfYield | OpKind::AffineYield => self.emit_yield(op, parent),
            OpKind::AffineFor { lower, upper, step } => self.emit_affine_for(op, lower, upper, *step),
            OpKind::AffineParallel {
                lower,
                upper,
                steps,
            } => self.emit_affine_parallel(op, lower, upper, steps),
            OpKind::AffineApply { map } => self.emit_affine_apply(op, map),
            OpKind::AffineMax { map } => self.emit_affine_chain(op, map, "max"),
            OpKind::AffineMin { map } => self.emit_affine_chain(op, map, "min"),
            OpKind::AffineLoad { map } => self.emit_affine_load(op, map),
            OpKind::AffineStore { map } => self.emit_affine_store(op, map),
            OpKind::Alloc | OpKind::Alloca => self.emit_alloc(op),
            OpKind::Load => self.emit_load(op),
            OpKind::Store => self.emit_store(op),
            OpKind::TensorLoad | OpKind::Assign => self.emit_copy(op, op.results[0], op.operands[0]),
            OpKind::TensorStore => self.emit_copy(op, op.operands[1], op.operands[0]),
            OpKind::TensorToMemref => self.emit_tensor_to_memref(op),
            OpKind::Dim => self.emit_dim(op),
            OpKind::Rank => self.emit_rank(op),
            OpKind::Binary { op: bin } => self.emit_binary(op, bin.syntax()),
            OpKind::CmpI { predicate } => self.emit_binary(op, predicate.syntax()),
            OpKind::CmpF { predicate } => match predicate.syntax() {
                Some(syntax) => self.emit_binary(op, syntax),
                None => self.error(
                    Some(op),
                    codes::E0302,
                    format!("comparison predicate {:?} has no C++ operator", predicate),
                ),
            },
            OpKind::Unary { op: unary } => self.emit_unary(op, unary.syntax()),
            OpKind::Select => self.emit_select(op),
            OpKind::Constant => self.emit_constant(op),
            OpKind::Cast { .. } => self.emit_cast(op),
            OpKind::Call { callee } => self.emit_call(op, callee),
            OpKind::Ip { kind } => self.emit_ip(op, *kind),
            OpKind::IpCall { name } => self.emit_ip_call(op, name),
            OpKind::Dealloc | OpKind::Return | OpKind::End => {}
            OpKind::Other { name } => self.error(
                Some(op),
                codes::E0400,
                format!("operation `{}` has no emission rule", name),
            ),
        }
    }

    // ── Functions ───────────────────────────────────────────────────────

    fn emit_module(&mut self, options: &EmitOptions) {
        self.out.push_str(PROLOGUE);
        for path in &options.include_paths {
            let escaped = path
                .to_string_lossy()
                .replace('\\', "\\\\")
                .replace('"', "\\\"");
            let _ = writeln!(self.out, "#include \"{}\"", escaped);
        }
        if !options.include_paths.is_empty() {
            self.out.push('\n');
        }
        let module = self.module;
        for func in &module.functions {
            self.emit_function(func);
        }
    }

    fn emit_function(&mut self, func: &'m Function) {
        self.function = Some(func.name.as_str());
        let errors_before = self.diagnostics.len();

        if func.blocks.len() != 1 {
            self.error(
                None,
                codes::E0100,
                format!("function body has {} blocks; expected exactly one", func.blocks.len()),
            );
        }
        let body = func.blocks.first();
        if let Some(body) = body {
            let returns = body
                .ops
                .iter()
                .filter(|op| op.kind == OpKind::Return)
                .count();
            if returns > 1 {
                self.error(
                    None,
                    codes::E0101,
                    format!(
                        "function body has {} return operations; expected exactly one",
                        returns
                    ),
                );
            }
        }

        if func.attrs.top_function {
            self.out.push_str("/// This is top function.\n");
        }
        if let Some(latency) = func.attrs.latency {
            let _ = write!(self.out, "/// Latency={}", latency);
            if let Some(ii) = func.attrs.ii {
                let _ = write!(self.out, ", II={}", ii);
            }
            self.out.push('\n');
        }
        if let Some(dsp) = func.attrs.dsp {
            let _ = writeln!(self.out, "/// DSP={}", dsp);
        }

        let _ = writeln!(self.out, "void {}(", func.name);
        let ports = self.emit_signature(func, body);
        self.out.push_str("\n) {");
        self.emit_info(func.line, None);

        {
            let mut inner = self.nest(1);
            inner.emit_function_pragmas(func, &ports);
            if let Some(body) = body {
                inner.emit_block(body, Parent::Function);
            }
        }
        self.out.push_str("}\n");
        self.out.push('\n');

        debug!(
            function = %func.name,
            ports = ports.len(),
            diagnostics = self.diagnostics.len() - errors_before,
            "emitted function"
        );
        self.function = None;
    }

    /// Write the port list (arguments, then returned values) and return the
    /// ports in order.
    fn emit_signature(&mut self, func: &'m Function, body: Option<&'m Block>) -> Vec<ValueId> {
        let mut ports = Vec::new();
        let mut inner = self.nest(1);

        for &arg in &func.args {
            if !ports.is_empty() {
                inner.out.push_str(",\n");
            }
            inner.indent();
            inner.emit_decl(arg, None);
            ports.push(arg);
        }

        let Some(ret) = body.and_then(Block::return_op) else {
            inner.error(
                None,
                codes::E0101,
                "function body is not terminated by a return operation",
            );
            return ports;
        };
        for &result in &ret.operands {
            if !ports.is_empty() {
                inner.out.push_str(",\n");
            }
            inner.indent();
            if inner.is_bound(result) {
                inner.error(
                    Some(ret),
                    codes::E0102,
                    format!("value %{} is already bound in the signature", result.0),
                );
                inner.emit_value(result, 0, Some(ret));
            } else if inner.info(result).is_shaped() {
                inner.emit_array_decl(result, Some(ret));
            } else {
                inner.emit_ptr_value(result, Some(ret));
            }
            ports.push(result);
        }
        ports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{ElemType, Literal, Shape, ValueInfo};

    fn module(values: Vec<ValueInfo>) -> Module {
        Module {
            values,
            functions: Vec::new(),
        }
    }

    #[test]
    fn indent_guard_restores_depth() {
        let m = module(Vec::new());
        let mut ctx = EmitCtx::new(&m);
        {
            let mut inner = ctx.nest(2);
            assert_eq!(inner.depth(), 2);
            inner.indent();
        }
        assert_eq!(ctx.depth(), 0);
        assert_eq!(ctx.out, "    ");
    }

    #[test]
    fn first_use_declares_with_type() {
        let m = module(vec![
            ValueInfo::scalar(ElemType::F32),
            ValueInfo::scalar(ElemType::unsigned(8)),
        ]);
        let mut ctx = EmitCtx::new(&m);
        ctx.emit_value(ValueId(0), 0, None);
        ctx.out.push_str(" = ");
        ctx.emit_value(ValueId(1), 0, None);
        ctx.out.push_str("; ");
        ctx.emit_value(ValueId(0), 0, None);
        assert_eq!(ctx.out, "float val0 = ap_uint<8> val1; val0");
    }

    #[test]
    fn array_declaration_lists_extents() {
        let m = module(vec![ValueInfo::array(ElemType::F64, &[4, 8])]);
        let mut ctx = EmitCtx::new(&m);
        ctx.emit_array_decl(ValueId(0), None);
        ctx.out.push(' ');
        ctx.emit_value(ValueId(0), 2, None);
        assert_eq!(ctx.out, "double val0[4][8] val0[idx0][idx1]");
    }

    #[test]
    fn dynamic_array_is_declared_as_pointer() {
        let m = module(vec![ValueInfo::with_shape(
            ElemType::F32,
            Shape::Ranked(vec![Some(4), None]),
        )]);
        let mut ctx = EmitCtx::new(&m);
        ctx.emit_array_decl(ValueId(0), None);
        assert_eq!(ctx.out, "float *val0");
        assert_eq!(ctx.diagnostics.len(), 1);
        assert_eq!(ctx.diagnostics[0].code, Some(codes::E0200));
        assert_eq!(ctx.diagnostics[0].hint.as_deref(), Some(STATIC_SHAPE_HINT));
    }

    #[test]
    fn half_precision_has_no_rendering() {
        let m = module(vec![ValueInfo::scalar(ElemType::F16)]);
        let mut ctx = EmitCtx::new(&m);
        ctx.emit_value(ValueId(0), 0, None);
        assert_eq!(ctx.out, "val0");
        assert_eq!(ctx.diagnostics[0].code, Some(codes::E0300));
    }

    #[test]
    fn constants_are_never_declared() {
        let m = module(vec![
            ValueInfo::scalar(ElemType::F32).with_constant(Literal::Float(f64::INFINITY)),
        ]);
        let mut ctx = EmitCtx::new(&m);
        ctx.emit_value(ValueId(0), 0, None);
        assert_eq!(ctx.out, "INFINITY");
        assert!(!ctx.names.is_declared(ValueId(0)));
    }

    #[test]
    fn info_comment_fields() {
        let m = module(Vec::new());
        let mut ctx = EmitCtx::new(&m);
        let attrs = OpAttrs {
            schedule_begin: Some(2),
            schedule_end: Some(5),
            iter_latency: Some(7),
            ii: Some(1),
            ..OpAttrs::default()
        };
        ctx.emit_info(Some(12), Some(&attrs));
        ctx.emit_info(None, None);
        assert_eq!(ctx.out, "\t// L12, S[2,5), latency=7, II=1\n\t//\n");
    }

    #[test]
    fn elementwise_wraps_body_in_index_loops() {
        let m = module(vec![ValueInfo::array(ElemType::F32, &[2, 3])]);
        let op = Op::new(OpKind::Assign, vec![], vec![ValueId(0)]);
        let mut ctx = EmitCtx::new(&m);
        ctx.elementwise(ValueId(0), &op, |ctx, rank| {
            ctx.indent();
            ctx.emit_value(ValueId(0), rank, None);
            ctx.out.push_str(";\n");
        });
        assert_eq!(
            ctx.out,
            "float val0[2][3];\n\
             for (int idx0 = 0; idx0 < 2; ++idx0) {\n\
             \x20\x20for (int idx1 = 0; idx1 < 3; ++idx1) {\n\
             \x20\x20\x20\x20val0[idx0][idx1];\n\
             \x20\x20}\n\
             }\n"
        );
        assert_eq!(ctx.depth(), 0);
    }
}
