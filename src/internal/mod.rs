//! Internal implementation modules.

mod cycle;

pub(crate) use cycle::CyclicDependencyValidator;
