use super::instrument::InstrumentationCall;
use super::report::PropertyAction;
use crate::config::PassConfig;
use crate::core::{Result, WeaveError};
use crate::model::ClassDefinition;
use tracing::{debug, trace};

pub struct Weaver<'a> {
    config: &'a PassConfig,
}

impl<'a> Weaver<'a> {
    pub fn new(config: &'a PassConfig) -> Self {
        Self { config }
    }

    /// Prepends the instrumentation call for `property` to the writer at
    /// `writer_idx`, keeping every existing statement in place after it.
    pub fn weave(
        &self,
        class: &mut ClassDefinition,
        writer_idx: usize,
        property: &str,
    ) -> Result<PropertyAction> {
        let class_name = class.name.clone();
        let writer = class.methods.get_mut(writer_idx).ok_or_else(|| {
            WeaveError::InvariantViolation(format!(
                "Class '{}': writer index {} out of range",
                class_name, writer_idx
            ))
        })?;

        if writer.params.len() != 1 {
            return Err(WeaveError::InvariantViolation(format!(
                "Class '{}': writer '{}' for '{}' takes {} parameters, expected exactly one",
                class_name,
                writer.name,
                property,
                writer.params.len()
            )));
        }

        if writer.has_annotation(&self.config.raw_accessor_marker) {
            trace!(class = %class_name, writer = %writer.name, "raw persistence accessor, not woven");
            return Ok(PropertyAction::Exempt {
                writer: writer.name.clone(),
            });
        }

        let call = InstrumentationCall::new(
            &self.config.instrumentation_method,
            property,
            &writer.params[0].name,
        );
        let statement = call.to_statement();

        let body = writer.body.get_or_insert_with(Vec::new);
        if body.first().is_some_and(|first| *first == statement) {
            return Ok(PropertyAction::AlreadyWoven {
                writer: writer.name.clone(),
            });
        }

        body.insert(0, statement);
        debug!(class = %class_name, writer = %writer.name, property = %property, "woven into writer");
        Ok(PropertyAction::Woven {
            writer: writer.name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Expr, MethodDeclaration, Statement, TypeRef};

    fn class_with_writer(writer: MethodDeclaration) -> ClassDefinition {
        ClassDefinition::new("Account").method(writer)
    }

    #[test]
    fn call_goes_first_and_original_statements_follow() {
        let config = PassConfig::default();
        let original = vec![
            Statement::Raw {
                text: "audit(v)".into(),
            },
            Statement::assign_field("name", Expr::var("v")),
        ];
        let mut class = class_with_writer(
            MethodDeclaration::new("setName")
                .param("v", TypeRef::new("String"))
                .body(original.clone()),
        );

        let action = Weaver::new(&config).weave(&mut class, 0, "name").unwrap();

        assert_eq!(action, PropertyAction::Woven { writer: "setName".into() });
        let body = class.methods[0].body.as_ref().unwrap();
        assert_eq!(body[0].to_string(), "this.markDirty(\"name\", v)");
        assert_eq!(&body[1..], original.as_slice());
    }

    #[test]
    fn raw_accessor_marker_bypasses_weaving() {
        let config = PassConfig::default();
        let mut class = class_with_writer(
            MethodDeclaration::new("setName")
                .param("v", TypeRef::new("String"))
                .annotated("PersistenceMethod")
                .body(vec![Statement::assign_field("name", Expr::var("v"))]),
        );

        let action = Weaver::new(&config).weave(&mut class, 0, "name").unwrap();

        assert!(matches!(action, PropertyAction::Exempt { .. }));
        assert_eq!(class.methods[0].body.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn weaving_twice_is_a_no_op() {
        let config = PassConfig::default();
        let mut class = class_with_writer(
            MethodDeclaration::new("setName")
                .param("v", TypeRef::new("String"))
                .body(vec![Statement::assign_field("name", Expr::var("v"))]),
        );
        let weaver = Weaver::new(&config);

        weaver.weave(&mut class, 0, "name").unwrap();
        let second = weaver.weave(&mut class, 0, "name").unwrap();

        assert!(matches!(second, PropertyAction::AlreadyWoven { .. }));
        assert_eq!(class.methods[0].body.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn wrong_arity_is_an_invariant_violation() {
        let config = PassConfig::default();
        let mut class = class_with_writer(
            MethodDeclaration::new("setName")
                .param("a", TypeRef::new("String"))
                .param("b", TypeRef::new("String")),
        );

        let err = Weaver::new(&config).weave(&mut class, 0, "name").unwrap_err();
        assert!(matches!(err, WeaveError::InvariantViolation(msg) if msg.contains("setName")));
    }
}
