// src/analysis/calls.rs
//! Call-site enumeration: lowers the loaded universe to control-flow
//! form, classifies every call-shaped instruction, and groups call sites
//! by owning package.

use crate::datamodel::{CallSite, CallType, Location};
use crate::errors::AnalysisError;
use crate::flow::{lower_packages, Callee, CallKind, PositionTable};
use crate::loader::Package;
use crate::sema::Universe;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

/// Capability boundary: call extraction. Returns call sites keyed by
/// package import path plus the authoritative position table.
pub trait CallAnalyzer {
    fn analyze_calls(
        &self,
        packages: &[Package],
        universe: &Universe<'_>,
    ) -> Result<(FxHashMap<String, Vec<CallSite>>, PositionTable), AnalysisError>;
}

/// Extractor backed by the control-flow lowering.
#[derive(Debug, Default)]
pub struct FlowCallAnalyzer;

impl FlowCallAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl CallAnalyzer for FlowCallAnalyzer {
    fn analyze_calls(
        &self,
        packages: &[Package],
        universe: &Universe<'_>,
    ) -> Result<(FxHashMap<String, Vec<CallSite>>, PositionTable), AnalysisError> {
        let (program, table) = lower_packages(packages, universe)?;
        if table.file_count() == 0 {
            return Err(AnalysisError::NoPositionTable);
        }

        // Map lowered functions back to loader packages by import path;
        // the lowered universe may include packages outside the loader
        // list.
        let loaded: FxHashSet<&str> = packages.iter().map(|p| p.import_path.as_str()).collect();

        let mut calls: FxHashMap<String, Vec<CallSite>> = FxHashMap::default();
        // Deterministic emission: iterate functions sorted by canonical
        // name.
        let mut order: Vec<usize> = (0..program.functions.len()).collect();
        order.sort_by(|&a, &b| program.functions[a].name.cmp(&program.functions[b].name));

        for idx in order {
            let func = &program.functions[idx];
            if !func.has_body() {
                continue;
            }
            if !loaded.contains(func.pkg_path.as_str()) {
                debug!(
                    func = %func.name,
                    package = %func.pkg_path,
                    "lowered function has no loaded package; skipping"
                );
                continue;
            }
            for block in &func.blocks {
                for instr in &block.instrs {
                    let Some(pos) = instr.pos else {
                        debug!(func = %func.name, "skipping call with invalid position");
                        continue;
                    };
                    let position = table.lookup(pos);
                    let (call_type, callee_desc) = describe(instr.kind, &instr.callee, &func.name);
                    let callee_desc = if callee_desc.is_empty() {
                        warn!(
                            func = %func.name,
                            "empty callee description generated; emitting placeholder"
                        );
                        "Analysis Error: Empty Callee Description".to_string()
                    } else {
                        callee_desc
                    };
                    calls
                        .entry(func.pkg_path.clone())
                        .or_default()
                        .push(CallSite {
                            caller_func_desc: func.name.clone(),
                            callee_desc,
                            call_type,
                            location: Location {
                                filename: position.filename.to_string_lossy().into_owned(),
                                line: position.line,
                            },
                        });
                }
            }
        }
        Ok((calls, table))
    }
}

fn describe(kind: CallKind, callee: &Callee, caller: &str) -> (CallType, String) {
    let flavor = match (kind, callee) {
        (CallKind::Call, Callee::Invoke { .. }) => CallType::Interface,
        (CallKind::Call, Callee::Dynamic { .. }) => CallType::Dynamic,
        (CallKind::Call, _) => CallType::Static,
        (CallKind::Go, _) => CallType::ConcurrentSpawn,
        (CallKind::Defer, _) => CallType::Deferred,
    };
    let desc = match callee {
        Callee::Static { name } => name.clone(),
        Callee::Invoke { method, recv_ty } => {
            format!("Interface method {} on {}", method, recv_ty)
        }
        Callee::Dynamic { operand, ty } => {
            let operand = if operand.is_empty() {
                "anonymous_func_value"
            } else {
                operand
            };
            format!("Dynamic via {} ({})", operand, ty)
        }
        Callee::Unknown => {
            warn!(func = %caller, "call with no resolvable callee");
            match kind {
                CallKind::Call => "Unknown Static/Dynamic Call".to_string(),
                CallKind::Go => "Unknown Go Callee".to_string(),
                CallKind::Defer => "Unknown Defer Callee".to_string(),
            }
        }
    };
    (flavor, desc)
}
