use super::report::GateOutcome;
use crate::config::PassConfig;
use crate::core::Result;
use crate::host::CapabilityComposer;
use crate::model::{ClassDefinition, TypeRef};
use tracing::trace;

/// Decides how the class gets the change-tracking capability.
pub fn evaluate(class: &ClassDefinition, config: &PassConfig) -> GateOutcome {
    if class.has_capability(&config.capability) {
        return GateOutcome::AlreadyPresent;
    }
    if has_user_ancestor(class, config) {
        return GateOutcome::Inherited;
    }
    GateOutcome::Attached
}

/// Applies the gate decision: attaches the marker when needed and lets the
/// composer materialize its default behaviour. Returns the outcome and
/// whether composition ran.
pub fn apply(
    class: &mut ClassDefinition,
    config: &PassConfig,
    composer: Option<&mut (dyn CapabilityComposer + '_)>,
) -> Result<(GateOutcome, bool)> {
    let outcome = evaluate(class, config);
    if outcome != GateOutcome::Attached {
        trace!(class = %class.name, ?outcome, "capability not attached");
        return Ok((outcome, false));
    }

    class.capabilities.push(TypeRef::new(config.capability.clone()));

    let Some(composer) = composer else {
        return Ok((outcome, false));
    };
    composer.compose(class, config)?;
    Ok((outcome, true))
}

fn has_user_ancestor(class: &ClassDefinition, config: &PassConfig) -> bool {
    match &class.ancestor {
        None => false,
        Some(ancestor) => !config
            .base_objects
            .iter()
            .any(|base| base == &ancestor.name || base == ancestor.simple_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::DefaultMethodBundle;

    #[test]
    fn base_object_ancestor_gets_the_marker() {
        let config = PassConfig::default();
        let mut class = ClassDefinition::new("Account").extends(TypeRef::new("java.lang.Object"));

        let (outcome, composed) = apply(&mut class, &config, None).unwrap();

        assert_eq!(outcome, GateOutcome::Attached);
        assert!(!composed);
        assert!(class.has_capability("DirtyCheckable"));
    }

    #[test]
    fn user_ancestor_is_assumed_to_carry_the_marker() {
        let config = PassConfig::default();
        let mut class = ClassDefinition::new("Savings").extends(TypeRef::new("Account"));

        let (outcome, _) = apply(&mut class, &config, None).unwrap();

        assert_eq!(outcome, GateOutcome::Inherited);
        assert!(class.capabilities.is_empty());
    }

    #[test]
    fn existing_marker_is_not_duplicated_and_not_composed() {
        let config = PassConfig::default();
        let mut class = ClassDefinition::new("Account").implements(TypeRef::new("DirtyCheckable"));
        let mut bundle = DefaultMethodBundle::new();

        let (outcome, composed) = apply(&mut class, &config, Some(&mut bundle)).unwrap();

        assert_eq!(outcome, GateOutcome::AlreadyPresent);
        assert!(!composed);
        assert_eq!(class.capabilities.len(), 1);
        assert!(class.methods.is_empty());
    }

    #[test]
    fn composer_runs_right_after_attachment() {
        let config = PassConfig::default();
        let mut class = ClassDefinition::new("Account");
        let mut bundle = DefaultMethodBundle::new();

        let (_, composed) = apply(&mut class, &config, Some(&mut bundle)).unwrap();

        assert!(composed);
        assert!(class.has_method("markDirty", 2));
    }
}
