use crate::value::Value;

/// The two layered contexts an evaluator reads and writes.
///
/// Both are borrowed from the caller for the duration of one call;
/// `Value::Undefined` stands for an absent context.
#[derive(Debug, Clone, Copy)]
pub struct EvalCtx<'a> {
    /// Long-lived application data.
    pub scope: &'a Value,
    /// Short-lived bindings that shadow `scope`.
    pub locals: &'a Value,
}

impl<'a> EvalCtx<'a> {
    pub fn new(scope: &'a Value, locals: &'a Value) -> Self {
        EvalCtx { scope, locals }
    }

    /// The container a bare identifier resolves against: `locals` when it has
    /// an own property `name`, otherwise `scope`.
    pub fn container_of(&self, name: &str) -> &'a Value {
        if self.locals.has_own(name) {
            self.locals
        } else {
            self.scope
        }
    }
}
