// ip.rs — Accelerator IP call templates
//
// Each IP kind maps to one fixed template: stream declarations, mover and
// stream-reader calls, the compute routine, and stream-writer calls. A
// template is data only; `{key}` placeholders are filled from the operand
// names (by role), static extents of operands, the element data type, and a
// few fixed parallelism constants.
//
// Preconditions: operands are listed in the role order of the template.
// Postconditions: one line per template line at the current indentation;
//                 no trailing info comment.
// Failure modes: role/operand count mismatch (E0105), an extent read from a
//                value without enough static dimensions (E0200), an
//                unterminated or unknown placeholder (E0105).
// Side effects: none.

use std::fmt::Write as _;

use crate::diag::codes;
use crate::emit::EmitCtx;
use crate::ir::{ElemType, IpKind, Op};

/// log2 of the BLAS parallelism factor.
const LOG_PAR_ENTRIES: i64 = 2;
const PAR_ENTRIES: i64 = 4;
/// Band widths used for banded matrix-vector products.
const GBMV_KL: i64 = 4;
const GBMV_KU: i64 = 3;
const PSQRT_UNROLL: i64 = 2;

/// Where a numeric template parameter comes from.
#[derive(Debug, Clone, Copy)]
enum Extent {
    /// Static extent `dim` of the operand bound to a role.
    Dim(&'static str, usize),
    /// Product of two earlier extents.
    Product(&'static str, &'static str),
}

#[derive(Debug)]
struct IpTemplate {
    routine: &'static str,
    /// Operand roles, in operand order.
    roles: &'static [&'static str],
    /// Role whose element type selects `{DT}`.
    dtype_role: &'static str,
    extents: &'static [(&'static str, Extent)],
    /// Empty strings are blank lines.
    lines: &'static [&'static str],
}

// Reductions over one vector share a layout; only the routine differs.
macro_rules! vector_reduction {
    ($routine:literal) => {
        IpTemplate {
            routine: $routine,
            roles: &["x", "res"],
            dtype_role: "x",
            extents: &[("n", Extent::Dim("x", 0))],
            lines: &[
                "#pragma HLS DATAFLOW",
                "{DT} l_res;",
                "hls::stream<typename WideType<{DT}, 1 << {LP}>::t_TypeInt> l_strX;",
                "",
                "readVec2Stream<{DT}, 1 << {LP}>({x}, {n}, l_strX);",
                concat!($routine, "<{DT}, {LP}, {DT}>({n}, l_strX, l_res);"),
                "{res} = l_res;",
            ],
        }
    };
}

static AMAX: IpTemplate = vector_reduction!("amax");
static AMIN: IpTemplate = vector_reduction!("amin");
static ASUM: IpTemplate = vector_reduction!("asum");

static AXPY: IpTemplate = IpTemplate {
    routine: "axpy",
    roles: &["alpha", "x", "y", "res"],
    dtype_role: "x",
    extents: &[("n", Extent::Dim("x", 0))],
    lines: &[
        "#pragma HLS DATAFLOW",
        "hls::stream<typename WideType<{DT}, 1 << {LP}>::t_TypeInt> l_strX;",
        "hls::stream<typename WideType<{DT}, 1 << {LP}>::t_TypeInt> l_strY;",
        "hls::stream<typename WideType<{DT}, 1 << {LP}>::t_TypeInt> l_strR;",
        "",
        "readVec2Stream<{DT}, 1 << {LP}>({x}, {n}, l_strX);",
        "readVec2Stream<{DT}, 1 << {LP}>({y}, {n}, l_strY);",
        "axpy<{DT}, 1 << {LP}>({n}, {alpha}, l_strX, l_strY, l_strR);",
        "writeStream2Vec<{DT}, {PE}>(l_strR, {n}, {res});",
    ],
};

static DOT: IpTemplate = IpTemplate {
    routine: "dot",
    roles: &["x", "y", "res"],
    dtype_role: "x",
    extents: &[("n", Extent::Dim("x", 0))],
    lines: &[
        "#pragma HLS DATAFLOW",
        "{DT} l_res;",
        "hls::stream<typename WideType<{DT}, 1 << {LP}>::t_TypeInt> l_strX;",
        "hls::stream<typename WideType<{DT}, 1 << {LP}>::t_TypeInt> l_strY;",
        "",
        "readVec2Stream<{DT}, 1 << {LP}>({x}, {n}, l_strX);",
        "readVec2Stream<{DT}, 1 << {LP}>({y}, {n}, l_strY);",
        "dot<{DT}, {LP}>({n}, l_strX, l_strY, l_res);",
        "{res} = l_res;",
    ],
};

static GBMV: IpTemplate = IpTemplate {
    routine: "gbmv",
    roles: &["alpha", "beta", "a", "x", "y", "res"],
    dtype_role: "x",
    extents: &[("n", Extent::Dim("x", 0)), ("m", Extent::Dim("y", 0))],
    lines: &[
        "#pragma HLS DATAFLOW",
        "hls::stream<typename WideType<{DT}, {PE}>::t_TypeInt> l_strA;",
        "hls::stream<typename WideType<{DT}, {PE}>::t_TypeInt> l_strX;",
        "hls::stream<typename WideType<{DT}, {PE}>::t_TypeInt> l_strYR;",
        "hls::stream<typename WideType<{DT}, {PE}>::t_TypeInt> l_strY;",
        "",
        "gbm2Stream<{DT}, {PE}>({n}, {kl}, {ku}, {a}, l_strA);",
        "vec2GbMatStream<{DT}, {PE}>({n}, {kl}, {ku}, {x}, l_strX);",
        "readVec2Stream<{DT}, 1 << {LP}>({y}, {m}, l_strY);",
        "gbmv<{DT}, {PE}, {n}>({m}, {n}, {kl}, {ku}, {alpha}, l_strA, l_strX, {beta}, l_strY, l_strYR);",
        "writeStream2Vec<{DT}, {PE}>(l_strYR, {m}, {res});",
    ],
};

static GEMM: IpTemplate = IpTemplate {
    routine: "gemm",
    roles: &["alpha", "beta", "A", "B", "C", "R"],
    dtype_role: "A",
    extents: &[
        ("m", Extent::Dim("A", 0)),
        ("k", Extent::Dim("A", 1)),
        ("n", Extent::Dim("B", 1)),
        ("mn", Extent::Product("m", "n")),
    ],
    lines: &[
        "#pragma HLS DATAFLOW",
        "hls::stream<typename WideType<{DT}, {PE}>::t_TypeInt> l_strA;",
        "hls::stream<typename WideType<{DT}, {PE}>::t_TypeInt> l_strB;",
        "hls::stream<typename WideType<{DT}, {PE}>::t_TypeInt> l_strC;",
        "hls::stream<typename WideType<{DT}, {PE}>::t_TypeInt> l_strSum;",
        "",
        "gemmMatAMover<{DT}, {PE}>({A}, {m}, {n}, {k}, l_strA);",
        "gemmMatBMover<{DT}, {PE}>({B}, {m}, {n}, {k}, l_strB);",
        "readVec2Stream<{DT}, {PE}>({C}, {mn}, l_strC);",
        "gemm<{DT}, {k}, {PE}, {mn}>({m}, {n}, {k}, {alpha}, l_strA, l_strB, {beta}, l_strC, l_strSum);",
        "writeStream2Vec<{DT}, {PE}>(l_strSum, {mn}, {R});",
    ],
};

static GEMV: IpTemplate = IpTemplate {
    routine: "gemv",
    roles: &["alpha", "beta", "a", "x", "y", "res"],
    dtype_role: "x",
    extents: &[("m", Extent::Dim("a", 0)), ("n", Extent::Dim("a", 1))],
    lines: &[
        "#pragma HLS DATAFLOW",
        "hls::stream<typename WideType<{DT}, 1 << {LP}>::t_TypeInt> l_strA;",
        "hls::stream<typename WideType<{DT}, 1 << {LP}>::t_TypeInt> l_strX;",
        "hls::stream<typename WideType<{DT}, 1>::t_TypeInt> l_strY;",
        "hls::stream<typename WideType<{DT}, 1>::t_TypeInt> l_strYR;",
        "",
        "gem2Stream<{DT}, {PE}>({m}, {n}, {a}, l_strA);",
        "vec2GemStream<{DT}, {PE}>({m}, {n}, {x}, l_strX);",
        "readVec2Stream<{DT}, 1>({y}, {m}, l_strY);",
        "gemv<{DT}, {LP}>({m}, {n}, {alpha}, l_strA, l_strX, {beta}, l_strY, l_strYR);",
        "writeStream2Vec<{DT}, 1>(l_strYR, {m}, {res});",
    ],
};

static NRM2: IpTemplate = IpTemplate {
    routine: "nrm2",
    roles: &["x", "res"],
    dtype_role: "x",
    extents: &[("n", Extent::Dim("x", 0))],
    lines: &[
        "#pragma HLS DATAFLOW",
        "{DT} l_res;",
        "hls::stream<typename WideType<{DT}, 1 << {LP}>::t_TypeInt> l_strX;",
        "",
        "readVec2Stream<{DT}, 1 << {LP}>({x}, {n}, l_strX);",
        "nrm2<{DT}, {LP}>({n}, l_strX, l_res);",
        "{res} = l_res;",
    ],
};

static SCAL: IpTemplate = IpTemplate {
    routine: "scal",
    roles: &["alpha", "x", "res"],
    dtype_role: "x",
    extents: &[("n", Extent::Dim("x", 0))],
    lines: &[
        "#pragma HLS DATAFLOW",
        "hls::stream<typename WideType<{DT}, {PE}>::t_TypeInt> l_strX;",
        "hls::stream<typename WideType<{DT}, {PE}>::t_TypeInt> l_strR;",
        "",
        "readVec2Stream<{DT}, {PE}>({x}, {n}, l_strX);",
        "scal<{DT}, {PE}>({n}, {alpha}, l_strX, l_strR);",
        "writeStream2Vec<{DT}, {PE}>(l_strR, {n}, {res});",
    ],
};

static SWAP: IpTemplate = IpTemplate {
    routine: "swap",
    roles: &["x", "xres", "y", "yres"],
    dtype_role: "x",
    extents: &[("n", Extent::Dim("x", 0))],
    lines: &[
        "#pragma HLS DATAFLOW",
        "hls::stream<typename WideType<{DT}, {PE}>::t_TypeInt> l_strX;",
        "hls::stream<typename WideType<{DT}, {PE}>::t_TypeInt> l_strResX;",
        "hls::stream<typename WideType<{DT}, {PE}>::t_TypeInt> l_strY;",
        "hls::stream<typename WideType<{DT}, {PE}>::t_TypeInt> l_strResY;",
        "",
        "readVec2Stream<{DT}, {PE}>({x}, {n}, l_strX);",
        "readVec2Stream<{DT}, {PE}>({y}, {n}, l_strY);",
        "swap<{DT}, {PE}>({n}, l_strX, l_strY, l_strResX, l_strResY);",
        "writeStream2Vec<{DT}, {PE}>(l_strResX, {n}, {xres});",
        "writeStream2Vec<{DT}, {PE}>(l_strResY, {n}, {yres});",
    ],
};

static SYMV: IpTemplate = IpTemplate {
    routine: "symv",
    roles: &["alpha", "beta", "a", "x", "y", "res"],
    dtype_role: "x",
    extents: &[("m", Extent::Dim("y", 0)), ("n", Extent::Dim("x", 0))],
    lines: &[
        "#pragma HLS DATAFLOW",
        "hls::stream<typename WideType<{DT}, {PE}>::t_TypeInt> l_strA;",
        "hls::stream<typename WideType<{DT}, {PE}>::t_TypeInt> l_strX;",
        "hls::stream<typename WideType<{DT}, {PE}>::t_TypeInt> l_strY;",
        "hls::stream<typename WideType<{DT}, {PE}>::t_TypeInt> l_strYR;",
        "",
        "symUp2Stream<{DT}, {PE}>({n}, {a}, l_strA);",
        "vec2SymStream<{DT}, {PE}>({n}, {x}, l_strX);",
        "readVec2Stream<{DT}, {PE}>({y}, {m}, l_strY);",
        "symv<{DT}, {LP}>({m}, {alpha}, l_strA, l_strX, {beta}, l_strY, l_strYR);",
        "writeStream2Vec<{DT}, {PE}>(l_strYR, {m}, {res});",
    ],
};

static TRMV: IpTemplate = IpTemplate {
    routine: "trmv",
    roles: &["alpha", "beta", "a", "x", "y", "res"],
    dtype_role: "x",
    extents: &[("n", Extent::Dim("x", 0))],
    lines: &[
        "#pragma HLS DATAFLOW",
        "hls::stream<typename WideType<{DT}, {PE}>::t_TypeInt> l_strA;",
        "hls::stream<typename WideType<{DT}, {PE}>::t_TypeInt> l_strX;",
        "hls::stream<typename WideType<{DT}, 1>::t_TypeInt> l_strY;",
        "hls::stream<typename WideType<{DT}, 1>::t_TypeInt> l_strYR;",
        "",
        "trmUp2Stream<{DT}, {PE}>({n}, {a}, l_strA);",
        "vec2TrmUpStream<{DT}, {PE}>({n}, {x}, l_strX);",
        "readVec2Stream<{DT}, 1>({y}, {n}, l_strY);",
        "trmv<{DT}, {LP}>(true, {n}, {alpha}, l_strA, l_strX, {beta}, l_strY, l_strYR);",
        "writeStream2Vec<{DT}, 1>(l_strYR, {n}, {res});",
    ],
};

static FFT: IpTemplate = IpTemplate {
    routine: "fft",
    roles: &["in", "out"],
    dtype_role: "in",
    extents: &[],
    lines: &["xf::dsp::fft::fft<fftParams, 0>({in}, {out});"],
};

static PSEUDO_SQRT: IpTemplate = IpTemplate {
    routine: "pseudosqrt",
    roles: &["nrows", "in", "out"],
    dtype_role: "in",
    extents: &[("size", Extent::Dim("in", 0))],
    lines: &["xf::solver::pseudosqrt<{DT}, {size}, {unroll}>({nrows}, {in}, {out});"],
};

fn template(kind: IpKind) -> &'static IpTemplate {
    match kind {
        IpKind::Amax => &AMAX,
        IpKind::Amin => &AMIN,
        IpKind::Asum => &ASUM,
        IpKind::Axpy => &AXPY,
        IpKind::Dot => &DOT,
        IpKind::Gbmv => &GBMV,
        IpKind::Gemm => &GEMM,
        IpKind::Gemv => &GEMV,
        IpKind::Nrm2 => &NRM2,
        IpKind::Scal => &SCAL,
        IpKind::Swap => &SWAP,
        IpKind::Symv => &SYMV,
        IpKind::Trmv => &TRMV,
        IpKind::Fft => &FFT,
        IpKind::PseudoSqrt => &PSEUDO_SQRT,
    }
}

/// `double` for f64 data, `int` for index data, `float` otherwise.
fn data_type(elem: ElemType) -> &'static str {
    match elem {
        ElemType::F64 => "double",
        ElemType::Index => "int",
        _ => "float",
    }
}

/// Replace every `{key}` in `line`. Returns the unresolved key on failure.
fn substitute(line: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<String, String> {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            return Err(after.to_string());
        };
        let key = &after[..close];
        out.push_str(&lookup(key).ok_or_else(|| key.to_string())?);
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

impl<'m> EmitCtx<'m> {
    pub(crate) fn emit_ip(&mut self, op: &'m Op, kind: IpKind) {
        let tpl = template(kind);
        if op.operands.len() != tpl.roles.len() {
            self.error(
                Some(op),
                codes::E0105,
                format!(
                    "{} expects {} operands ({}); found {}",
                    tpl.routine,
                    tpl.roles.len(),
                    tpl.roles.join(", "),
                    op.operands.len()
                ),
            );
            return;
        }
        let operand_of = |role: &str| {
            tpl.roles
                .iter()
                .position(|r| *r == role)
                .map(|idx| op.operands[idx])
        };

        let mut extents: Vec<(&'static str, i64)> = Vec::new();
        for &(key, extent) in tpl.extents {
            let value = match extent {
                Extent::Dim(role, dim) => {
                    let dims = operand_of(role).and_then(|id| self.info(id).shape.static_dims());
                    match dims.as_ref().and_then(|dims| dims.get(dim)) {
                        Some(v) => *v,
                        None => {
                            self.error(
                                Some(op),
                                codes::E0200,
                                format!(
                                    "{} needs static dimension {} of operand `{}`",
                                    tpl.routine, dim, role
                                ),
                            );
                            return;
                        }
                    }
                }
                Extent::Product(lhs, rhs) => {
                    let get = |k: &str| extents.iter().find(|(e, _)| *e == k).map(|(_, v)| *v);
                    match get(lhs).unwrap_or(0).checked_mul(get(rhs).unwrap_or(0)) {
                        Some(v) => v,
                        None => {
                            self.error(
                                Some(op),
                                codes::E0200,
                                format!(
                                    "{} extent `{}` = {} * {} overflows",
                                    tpl.routine, key, lhs, rhs
                                ),
                            );
                            return;
                        }
                    }
                }
            };
            extents.push((key, value));
        }

        let dtype = operand_of(tpl.dtype_role)
            .map(|id| data_type(self.info(id).elem))
            .unwrap_or("float");
        let names = &self.names;
        let lookup = |key: &str| -> Option<String> {
            match key {
                "DT" => Some(dtype.to_string()),
                "LP" => Some(LOG_PAR_ENTRIES.to_string()),
                "PE" => Some(PAR_ENTRIES.to_string()),
                "kl" => Some(GBMV_KL.to_string()),
                "ku" => Some(GBMV_KU.to_string()),
                "unroll" => Some(PSQRT_UNROLL.to_string()),
                _ => extents
                    .iter()
                    .find(|(k, _)| *k == key)
                    .map(|(_, v)| v.to_string())
                    .or_else(|| operand_of(key).map(|id| names.lookup_name(id))),
            }
        };

        let rendered: Result<Vec<String>, String> = tpl
            .lines
            .iter()
            .map(|line| substitute(line, &lookup))
            .collect();
        let rendered = match rendered {
            Ok(lines) => lines,
            Err(key) => {
                self.error(
                    Some(op),
                    codes::E0105,
                    format!("{} template has unresolved placeholder `{}`", tpl.routine, key),
                );
                return;
            }
        };
        for text in rendered {
            if !text.is_empty() {
                self.indent();
                self.out.push_str(&text);
            }
            self.out.push('\n');
        }
    }

    /// Generic IP: `__IP__<name>(args..);`.
    pub(crate) fn emit_ip_call(&mut self, op: &'m Op, name: &str) {
        self.indent();
        let _ = write!(self.out, "__IP__{}(", name);
        for (idx, &arg) in op.operands.iter().enumerate() {
            if idx > 0 {
                self.out.push_str(", ");
            }
            self.emit_value(arg, 0, Some(op));
        }
        self.out.push_str(");\n");
    }
}
