pub mod builtin;
pub mod command;
pub mod parse;
pub mod plan_file;

pub use builtin::BuiltinDecomposer;
pub use command::CommandDecomposer;
pub use parse::parse_decomposition;
pub use plan_file::{parse_plan_file, PlanFileDecomposer};
