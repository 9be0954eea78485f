//! Language-neutral class model handed over by a host compiler.

pub mod body;
pub mod class;
pub mod types;

pub use body::{Expr, Statement};
pub use class::{
    AttributeDeclaration, ClassDefinition, MethodDeclaration, Modifiers, Parameter, Visibility,
};
pub use types::{GenericArg, TypeRef};
