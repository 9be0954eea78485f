//! Collaborators supplied by the host build: which classes belong to the
//! persistence model, and how a capability's default behaviour gets onto a
//! class.

use crate::config::PassConfig;
use crate::core::{Result, WeaveError};
use crate::model::{
    AttributeDeclaration, ClassDefinition, Expr, GenericArg, MethodDeclaration, Modifiers,
    Statement, TypeRef, Visibility,
};
use tracing::trace;

/// Answers the two questions asked before a class enters the pass.
pub trait ModelClassifier {
    /// Does `class` belong to the persistence model?
    fn is_model_class(&self, class: &ClassDefinition) -> bool;

    /// Is `class` an artefact that must be left alone (e.g. already
    /// processed by another transformation)?
    fn is_exempt(&self, class: &ClassDefinition) -> bool;
}

/// Classifies by class annotation.
#[derive(Debug, Clone)]
pub struct AnnotationClassifier {
    model_markers: Vec<String>,
    exempt_markers: Vec<String>,
}

impl AnnotationClassifier {
    pub fn new() -> Self {
        Self {
            model_markers: vec!["Entity".to_string()],
            exempt_markers: vec!["Artefact".to_string()],
        }
    }

    pub fn model_marker(mut self, marker: &str) -> Self {
        self.model_markers.push(marker.to_string());
        self
    }

    pub fn exempt_marker(mut self, marker: &str) -> Self {
        self.exempt_markers.push(marker.to_string());
        self
    }
}

impl Default for AnnotationClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelClassifier for AnnotationClassifier {
    fn is_model_class(&self, class: &ClassDefinition) -> bool {
        self.model_markers
            .iter()
            .any(|marker| class.has_annotation(marker))
    }

    fn is_exempt(&self, class: &ClassDefinition) -> bool {
        self.exempt_markers
            .iter()
            .any(|marker| class.has_annotation(marker))
    }
}

/// Treats every class as a model class; nothing is exempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllClasses;

impl ModelClassifier for AllClasses {
    fn is_model_class(&self, _class: &ClassDefinition) -> bool {
        true
    }

    fn is_exempt(&self, _class: &ClassDefinition) -> bool {
        false
    }
}

/// Makes a capability's default behaviour physically present on a class.
pub trait CapabilityComposer {
    fn compose(&mut self, class: &mut ClassDefinition, config: &PassConfig) -> Result<()>;
}

/// Attribute holding the changed property names.
pub const CHANGED_PROPERTIES: &str = "$changedProperties";

/// Default-method table of the change-tracking capability.
///
/// Members already on the class (same name and arity) win over the bundle.
#[derive(Debug, Clone, Default)]
pub struct DefaultMethodBundle {
    composed: Vec<String>,
}

impl DefaultMethodBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the classes this bundle was merged into, in order.
    pub fn composed_classes(&self) -> &[String] {
        &self.composed
    }

    fn methods(config: &PassConfig) -> Vec<MethodDeclaration> {
        let string = || TypeRef::new("String");
        let boolean = || TypeRef::new("boolean");
        let changed = || Expr::field(CHANGED_PROPERTIES);
        let mark = config.instrumentation_method.as_str();

        vec![
            MethodDeclaration::new("trackChanges").body(vec![Statement::assign_field(
                CHANGED_PROPERTIES,
                Expr::Raw {
                    text: "new LinkedHashMap<>()".to_string(),
                },
            )]),
            MethodDeclaration::new("hasChanged")
                .returns(boolean())
                .body(vec![Statement::returning(Expr::Raw {
                    text: format!("{0} == null || !{0}.isEmpty()", changed()),
                })]),
            MethodDeclaration::new("hasChanged")
                .param("propertyName", string())
                .returns(boolean())
                .body(vec![Statement::returning(Expr::Raw {
                    text: format!("{0} == null || {0}.containsKey(propertyName)", changed()),
                })]),
            MethodDeclaration::new(mark).body(vec![Statement::assign_field(
                CHANGED_PROPERTIES,
                Expr::Raw {
                    text: "null".to_string(),
                },
            )]),
            MethodDeclaration::new(mark)
                .param("propertyName", string())
                .body(vec![Statement::expr(Expr::call(
                    mark,
                    vec![Expr::var("propertyName"), Expr::Raw {
                        text: "null".to_string(),
                    }],
                ))]),
            MethodDeclaration::new(mark)
                .param("propertyName", string())
                .param("newValue", TypeRef::new("Object"))
                .body(vec![Statement::Raw {
                    text: "if (this.$changedProperties != null && !this.$changedProperties.containsKey(propertyName)) this.$changedProperties.put(propertyName, newValue)"
                        .to_string(),
                }]),
            MethodDeclaration::new("getDirtyPropertyNames")
                .returns(TypeRef::new("List").with_args(vec![GenericArg::Concrete(string())]))
                .body(vec![Statement::returning(Expr::Raw {
                    text: format!("new ArrayList<>({}.keySet())", changed()),
                })]),
        ]
    }
}

impl CapabilityComposer for DefaultMethodBundle {
    fn compose(&mut self, class: &mut ClassDefinition, config: &PassConfig) -> Result<()> {
        if let Some(existing) = class.find_attribute(CHANGED_PROPERTIES) {
            if !existing.modifiers.is_transient {
                return Err(WeaveError::CompositionError(format!(
                    "Class '{}' declares '{}' as a persistent attribute",
                    class.name, CHANGED_PROPERTIES
                )));
            }
        } else {
            class.attributes.push(
                AttributeDeclaration::new(
                    CHANGED_PROPERTIES,
                    TypeRef::new("Map").with_args(vec![
                        GenericArg::Concrete(TypeRef::new("String")),
                        GenericArg::Concrete(TypeRef::new("Object")),
                    ]),
                )
                .visibility(Visibility::Private)
                .modifiers(Modifiers {
                    is_transient: true,
                    ..Modifiers::none()
                }),
            );
        }

        for method in Self::methods(config) {
            if class.has_method(&method.name, method.arity()) {
                trace!(class = %class.name, method = %method.name, "kept class's own method");
                continue;
            }
            class.methods.push(method);
        }

        self.composed.push(class.name.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_classifier_reads_class_markers() {
        let classifier = AnnotationClassifier::new().model_marker("Document");

        assert!(classifier.is_model_class(&ClassDefinition::new("A").annotated("Entity")));
        assert!(classifier.is_model_class(&ClassDefinition::new("B").annotated("x.y.Document")));
        assert!(!classifier.is_model_class(&ClassDefinition::new("C")));
        assert!(classifier.is_exempt(&ClassDefinition::new("D").annotated("Artefact")));
    }

    #[test]
    fn bundle_adds_state_and_methods_once() {
        let config = PassConfig::default();
        let mut bundle = DefaultMethodBundle::new();
        let mut class = ClassDefinition::new("Account").method(
            MethodDeclaration::new("hasChanged")
                .returns(TypeRef::new("boolean"))
                .body(vec![Statement::Raw {
                    text: "return true".into(),
                }]),
        );

        bundle.compose(&mut class, &config).unwrap();

        let state = class.find_attribute(CHANGED_PROPERTIES).unwrap();
        assert!(state.modifiers.is_transient);
        assert_eq!(state.visibility, Visibility::Private);
        assert!(class.has_method("markDirty", 0));
        assert!(class.has_method("markDirty", 1));
        assert!(class.has_method("markDirty", 2));
        assert!(class.has_method("getDirtyPropertyNames", 0));
        assert_eq!(
            class.methods.iter().filter(|m| m.name == "hasChanged" && m.arity() == 0).count(),
            1
        );
        assert_eq!(bundle.composed_classes(), ["Account".to_string()]);
    }

    #[test]
    fn persistent_state_attribute_is_a_conflict() {
        let config = PassConfig::default();
        let mut class = ClassDefinition::new("Account").attribute(AttributeDeclaration::new(
            CHANGED_PROPERTIES,
            TypeRef::new("Map"),
        ));

        let err = DefaultMethodBundle::new().compose(&mut class, &config).unwrap_err();
        assert!(matches!(err, WeaveError::CompositionError(_)));
    }
}
