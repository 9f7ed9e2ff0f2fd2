pub mod callgraph;
pub mod commands;
pub mod cursor;
pub mod dead_code;
pub mod dependencies;
pub mod guards;
pub mod hierarchy;
pub mod references;
pub mod search;
pub mod usages;
