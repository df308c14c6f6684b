//! Interpreters of the schema directives. Each one reads the arguments of its directive and either
//! records them on the schema or reports an error at the directive's path.

mod authorization;
mod field;
mod indexes;
mod node;
mod relationship;
