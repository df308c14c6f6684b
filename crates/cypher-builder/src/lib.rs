#![cfg_attr(test, allow(unused_crate_dependencies))]

//! A small Cypher AST with a renderer.
//!
//! Statements are assembled from [`Clause`]s and [`Expr`]s whose variables and parameters are
//! allocated by a shared [`Names`]. Rendering with [`Statement::build`] assigns the textual
//! names and collects the parameter map.

mod clause;
mod expr;
mod names;
mod pattern;
mod render;
mod value;

pub use clause::{Alias, Call, CallProcedure, Clause, Imports, Match, Order, Projection, Raw, SetItem};
pub use expr::{BinaryOperator, Expr, MapProjectionItem};
pub use names::{Names, Param, Variable, VariableKind};
pub use pattern::{Direction, NodePattern, Pattern, RelationshipPattern};
pub use render::{escape, Params, Statement};
pub use value::{BigInt, Crs, Point, Temporal, TemporalKind, Value};
