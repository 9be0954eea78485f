// ============================================================================
// dirtyweave library
// ============================================================================

pub mod class_lang;
pub mod config;
pub mod core;
pub mod host;
pub mod model;
pub mod pass;
pub mod tracking;

// Re-export main types for convenience
pub use class_lang::ClassProgram;
pub use config::{AccessorNaming, PassConfig, VoidPolicy};
pub use core::{Result, WeaveError};
pub use host::{
    AllClasses, AnnotationClassifier, CapabilityComposer, DefaultMethodBundle, ModelClassifier,
};
pub use model::{
    AttributeDeclaration, ClassDefinition, Expr, GenericArg, MethodDeclaration, Modifiers,
    Parameter, Statement, TypeRef, Visibility,
};
pub use pass::{ClassReport, DirtyTrackingPass, GateOutcome, PropertyAction, SkipReason};
pub use tracking::{DirtySet, DirtyTracking};

// ============================================================================
// Convenience entry points
// ============================================================================

/// Parses class-language source, runs the pass over every class the
/// classifier accepts and returns the transformed program with its reports.
///
/// # Examples
///
/// ```
/// use dirtyweave::{AllClasses, DefaultMethodBundle, PassConfig, PropertyAction};
///
/// # fn main() -> dirtyweave::Result<()> {
/// let source = "class Account {\n  property balance: BigDecimal\n}\n";
/// let mut bundle = DefaultMethodBundle::new();
/// let (program, reports) =
///     dirtyweave::weave_source(source, PassConfig::default(), &AllClasses, Some(&mut bundle))?;
///
/// assert!(program.classes[0].has_method("setBalance", 1));
/// assert!(matches!(
///     reports[0].outcome("balance").map(|o| &o.action),
///     Some(PropertyAction::Synthesized { .. })
/// ));
/// # Ok(())
/// # }
/// ```
pub fn weave_source(
    source: &str,
    config: PassConfig,
    classifier: &dyn ModelClassifier,
    composer: Option<&mut (dyn CapabilityComposer + '_)>,
) -> Result<(ClassProgram, Vec<ClassReport>)> {
    let mut program = ClassProgram::parse(source)?;
    let pass = DirtyTrackingPass::new(config)?;
    let reports = pass.transform_all(&mut program.classes, classifier, composer)?;
    Ok((program, reports))
}
