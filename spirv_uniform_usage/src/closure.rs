use std::collections::{BTreeSet, HashMap};

use rspirv::dr::{Function, Module};

use crate::{
    calls::called_functions, spirv::function_id, usage::used_variables, AnalyzeError, FunctionId,
    VariableId,
};

/// Function definitions of a module by id together with the variables to track.
pub struct FunctionIndex<'a> {
    functions: HashMap<FunctionId, &'a Function>,
    uniforms: &'a BTreeSet<VariableId>,
}

impl<'a> FunctionIndex<'a> {
    pub fn new(module: &'a Module, uniforms: &'a BTreeSet<VariableId>) -> Self {
        let functions = module
            .functions
            .iter()
            .filter_map(|f| Some((function_id(f)?, f)))
            .collect();
        Self {
            functions,
            uniforms,
        }
    }

    fn function(&self, id: FunctionId) -> Result<&'a Function, AnalyzeError> {
        self.functions
            .get(&id)
            .copied()
            .ok_or(AnalyzeError::UndefinedFunction { function: id })
    }
}

enum VisitState {
    InProgress,
    Done(BTreeSet<VariableId>),
}

struct Frame {
    function: FunctionId,
    callees: std::collections::btree_set::IntoIter<FunctionId>,
    closure: BTreeSet<VariableId>,
}

/// Memoized transitive uniform usage for the functions of a single module.
///
/// Each function's closure is computed at most once per context.
/// The context owns the [FunctionIndex] it was created from,
/// so memoized closures can't leak into queries for another module.
pub struct ClosureContext<'a> {
    index: FunctionIndex<'a>,
    states: HashMap<FunctionId, VisitState>,
    visits: HashMap<FunctionId, usize>,
}

impl<'a> ClosureContext<'a> {
    pub fn new(index: FunctionIndex<'a>) -> Self {
        Self {
            index,
            states: HashMap::new(),
            visits: HashMap::new(),
        }
    }

    /// The variables used by `function` or any function it calls, directly or indirectly.
    ///
    /// The call graph is traversed depth first with an explicit stack,
    /// so deep call chains don't overflow the native stack.
    /// A failed query leaves no unfinished functions behind,
    /// so later queries on the same context report their own errors.
    pub fn closure(&mut self, function: FunctionId) -> Result<BTreeSet<VariableId>, AnalyzeError> {
        match self.states.get(&function) {
            Some(VisitState::Done(closure)) => return Ok(closure.clone()),
            Some(VisitState::InProgress) => return Err(AnalyzeError::CallGraphCycle { function }),
            None => (),
        }

        let mut stack = Vec::new();
        let result = self.traverse(function, &mut stack);
        if result.is_err() {
            for frame in stack {
                self.states.remove(&frame.function);
            }
        }
        result
    }

    /// The number of times the closure of `function` was computed by this context.
    pub fn visit_count(&self, function: FunctionId) -> usize {
        self.visits.get(&function).copied().unwrap_or_default()
    }

    fn traverse(
        &mut self,
        function: FunctionId,
        stack: &mut Vec<Frame>,
    ) -> Result<BTreeSet<VariableId>, AnalyzeError> {
        let frame = self.enter(function)?;
        stack.push(frame);
        let mut result = BTreeSet::new();

        while let Some(frame) = stack.last_mut() {
            if let Some(callee) = frame.callees.next() {
                match self.states.get(&callee) {
                    Some(VisitState::Done(closure)) => frame.closure.extend(closure),
                    Some(VisitState::InProgress) => {
                        return Err(AnalyzeError::CallGraphCycle { function: callee });
                    }
                    None => {
                        let callee_frame = self.enter(callee)?;
                        stack.push(callee_frame);
                    }
                }
                continue;
            }

            // All callees are done, so this closure is final.
            let Some(Frame {
                function, closure, ..
            }) = stack.pop()
            else {
                break;
            };
            log::trace!("function {function} uses {closure:?}");

            if let Some(caller) = stack.last_mut() {
                caller.closure.extend(&closure);
            }
            self.states
                .insert(function, VisitState::Done(closure.clone()));
            result = closure;
        }

        Ok(result)
    }

    fn enter(&mut self, function: FunctionId) -> Result<Frame, AnalyzeError> {
        let definition = self.index.function(function)?;
        let callees = called_functions(definition)?;
        let used = used_variables(definition, self.index.uniforms);

        self.states.insert(function, VisitState::InProgress);
        *self.visits.entry(function).or_default() += 1;

        Ok(Frame {
            function,
            callees: callees.into_iter(),
            closure: used,
        })
    }
}
