// pragma.rs — HLS pragma derivation
//
// Array pragmas (resource core, array partitioning) are a pure function of a
// value's memory kind and partition layout. Function pragmas (dataflow,
// pipeline, interfaces) are a pure function of the function attributes and
// its port list. Loop pragmas come from the loop's own attributes.
//
// Preconditions: the value or ports being annotated are already declared.
// Postconditions: attributes are only read, never changed.
// Failure modes: an on-chip memory kind without a dedicated BRAM core falls
//                back to `ram_s2p_bram` with warning W0500.
// Side effects: none.

use std::fmt::Write as _;

use crate::diag::codes;
use crate::emit::EmitCtx;
use crate::id::ValueId;
use crate::ir::{Function, MemoryKind, Op, OpAttrs, PartitionKind};

impl<'m> EmitCtx<'m> {
    /// Resource and partition pragmas for an on-chip array, followed by a
    /// blank line when anything was written.
    pub(crate) fn emit_array_pragmas(&mut self, id: ValueId, op: Option<&Op>) {
        let info = self.info(id);
        if !info.memory.is_on_chip() {
            return;
        }
        let name = self.names.port_name(id);

        let core = match info.memory {
            MemoryKind::Bram1p => "ram_1p_bram",
            MemoryKind::BramS2p => "ram_s2p_bram",
            MemoryKind::BramT2p => "ram_t2p_bram",
            other => {
                self.warning(
                    op,
                    codes::W0500,
                    format!(
                        "memory kind {:?} of `{}` has no dedicated core; using ram_s2p_bram",
                        other, name
                    ),
                );
                "ram_s2p_bram"
            }
        };
        self.indent();
        let _ = writeln!(self.out, "#pragma HLS resource variable={} core={}", name, core);

        if let Some(layout) = &info.layout {
            for (dim, part) in layout.dims.iter().enumerate() {
                if part.factor == 1 || part.kind == PartitionKind::None {
                    continue;
                }
                let kind = match part.kind {
                    PartitionKind::Block => "block",
                    _ => "cyclic",
                };
                self.indent();
                let _ = writeln!(
                    self.out,
                    "#pragma HLS array_partition variable={} {} factor={} dim={}",
                    name,
                    kind,
                    part.factor,
                    dim + 1
                );
            }
        }

        self.out.push('\n');
    }

    /// Pragmas opening a function body. Interfaces are only emitted for the
    /// top function.
    pub(crate) fn emit_function_pragmas(&mut self, func: &Function, ports: &[ValueId]) {
        if func.attrs.dataflow {
            self.indent();
            self.out.push_str("#pragma HLS dataflow\n");
            self.out.push('\n');
        }

        if func.attrs.pipeline {
            self.indent();
            let _ = writeln!(
                self.out,
                "#pragma HLS pipeline II={}",
                func.attrs.target_ii.unwrap_or(1)
            );
            self.out.push('\n');
        }

        if !func.attrs.top_function {
            return;
        }

        self.indent();
        self.out
            .push_str("#pragma HLS interface s_axilite port=return bundle=ctrl\n");
        for &port in ports {
            let info = self.info(port);
            let name = self.names.port_name(port);
            if info.is_shaped() {
                match info.memory {
                    MemoryKind::None => continue,
                    MemoryKind::Dram => {
                        self.indent();
                        let _ = writeln!(self.out, "#pragma HLS interface m_axi offset=slave port={}", name);
                    }
                    _ => {
                        self.indent();
                        let _ = writeln!(self.out, "#pragma HLS interface bram port={}", name);
                    }
                }
            } else {
                self.indent();
                let _ = writeln!(
                    self.out,
                    "#pragma HLS interface s_axilite port={} bundle=ctrl",
                    name
                );
            }
        }
        self.out.push('\n');

        for &port in ports {
            if self.info(port).is_shaped() {
                self.emit_array_pragmas(port, None);
            }
        }
    }

    /// First lines inside a loop body.
    pub(crate) fn emit_loop_pragmas(&mut self, attrs: &OpAttrs) {
        if attrs.pipeline {
            self.indent();
            let _ = writeln!(self.out, "#pragma HLS pipeline II={}", attrs.target_ii.unwrap_or(1));
        }
        if attrs.unroll {
            self.indent();
            self.out.push_str("#pragma HLS unroll\n");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::emit::EmitCtx;
    use crate::id::ValueId;
    use crate::ir::{
        DimPartition, ElemType, FuncAttrs, Function, MemoryKind, Module, OpAttrs,
        PartitionLayout, ValueInfo,
    };

    fn module(values: Vec<ValueInfo>) -> Module {
        Module {
            values,
            functions: Vec::new(),
        }
    }

    fn declared(ctx: &mut EmitCtx<'_>, n: u32) {
        for id in 0..n {
            ctx.names.declare(ValueId(id), false).unwrap();
        }
    }

    #[test]
    fn resource_and_partition_pragmas() {
        let m = module(vec![ValueInfo::array(ElemType::F32, &[16, 8])
            .in_memory(MemoryKind::BramT2p)
            .partitioned(PartitionLayout::new(vec![
                DimPartition::cyclic(4),
                DimPartition::none(),
            ]))]);
        let mut ctx = EmitCtx::new(&m);
        declared(&mut ctx, 1);
        ctx.emit_array_pragmas(ValueId(0), None);
        assert_eq!(
            ctx.out,
            "#pragma HLS resource variable=val0 core=ram_t2p_bram\n\
             #pragma HLS array_partition variable=val0 cyclic factor=4 dim=1\n\n"
        );
        assert!(ctx.diagnostics.is_empty());
    }

    #[test]
    fn off_chip_arrays_get_no_array_pragmas() {
        let m = module(vec![
            ValueInfo::array(ElemType::F32, &[16])
                .in_memory(MemoryKind::Dram)
                .partitioned(PartitionLayout::new(vec![DimPartition::block(4)])),
            ValueInfo::array(ElemType::F32, &[16]),
        ]);
        let mut ctx = EmitCtx::new(&m);
        declared(&mut ctx, 2);
        ctx.emit_array_pragmas(ValueId(0), None);
        ctx.emit_array_pragmas(ValueId(1), None);
        assert_eq!(ctx.out, "");
    }

    #[test]
    fn uram_falls_back_with_warning() {
        let m = module(vec![ValueInfo::array(ElemType::F32, &[4]).in_memory(MemoryKind::Uram1p)]);
        let mut ctx = EmitCtx::new(&m);
        declared(&mut ctx, 1);
        ctx.emit_array_pragmas(ValueId(0), None);
        assert!(ctx.out.contains("core=ram_s2p_bram"));
        assert_eq!(ctx.diagnostics.len(), 1);
        assert!(!ctx.diagnostics[0].is_error());
    }

    #[test]
    fn top_function_interfaces() {
        let m = module(vec![
            ValueInfo::array(ElemType::F32, &[8]).in_memory(MemoryKind::Dram),
            ValueInfo::array(ElemType::F32, &[8]).in_memory(MemoryKind::Bram1p),
            ValueInfo::array(ElemType::F32, &[8]),
            ValueInfo::scalar(ElemType::F32),
        ]);
        let func = Function {
            name: "top".into(),
            args: vec![],
            attrs: FuncAttrs {
                top_function: true,
                dataflow: true,
                ..FuncAttrs::default()
            },
            blocks: vec![],
            line: None,
        };
        let mut ctx = EmitCtx::new(&m);
        declared(&mut ctx, 3);
        ctx.names.declare(ValueId(3), true).unwrap();
        ctx.emit_function_pragmas(&func, &[ValueId(0), ValueId(1), ValueId(2), ValueId(3)]);
        assert_eq!(
            ctx.out,
            "#pragma HLS dataflow\n\
             \n\
             #pragma HLS interface s_axilite port=return bundle=ctrl\n\
             #pragma HLS interface m_axi offset=slave port=val0\n\
             #pragma HLS interface bram port=val1\n\
             #pragma HLS interface s_axilite port=val3 bundle=ctrl\n\
             \n\
             #pragma HLS resource variable=val1 core=ram_1p_bram\n\
             \n"
        );
    }

    #[test]
    fn loop_pragmas_in_order() {
        let m = module(Vec::new());
        let mut ctx = EmitCtx::new(&m);
        let attrs = OpAttrs {
            pipeline: true,
            target_ii: Some(3),
            unroll: true,
            ..OpAttrs::default()
        };
        ctx.emit_loop_pragmas(&attrs);
        assert_eq!(ctx.out, "#pragma HLS pipeline II=3\n#pragma HLS unroll\n");
    }
}
