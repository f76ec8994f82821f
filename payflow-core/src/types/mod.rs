mod branch;
mod format;
mod mapping;
mod record;
mod step;
mod workflow;

pub use branch::{BranchNothing, BranchRule};
pub use format::Format;
pub use mapping::{FieldMapping, Target, Transform, TransformFn};
pub use record::{
    compare_values, insert_path, is_truthy, lookup, value_kind, values_match, Record,
};
pub use step::{Action, ActionStep, Check, FnAction, Predicate, Step};
pub use workflow::{ErrorHandler, FnErrorHandler, WorkflowDefinition};
