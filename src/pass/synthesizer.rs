use super::instrument::InstrumentationCall;
use super::report::{PresentAccessor, PropertyAction};
use crate::config::PassConfig;
use crate::core::{Result, WeaveError};
use crate::model::{ClassDefinition, Expr, MethodDeclaration, Statement, TypeRef};
use tracing::debug;

/// Annotation carried by every accessor this pass generates.
pub const GENERATED_MARKER: &str = "Generated";

/// Name of the writer parameter in synthesized setters.
pub const WRITER_PARAM: &str = "value";

pub struct AccessorSynthesizer<'a> {
    config: &'a PassConfig,
}

impl<'a> AccessorSynthesizer<'a> {
    pub fn new(config: &'a PassConfig) -> Self {
        Self { config }
    }

    /// Adds reader(s) and an instrumented writer for the attribute at
    /// `attribute_idx`. Reader names already taken on the class are left
    /// alone.
    pub fn synthesize(
        &self,
        class: &mut ClassDefinition,
        attribute_idx: usize,
    ) -> Result<PropertyAction> {
        let attribute = class.attributes.get(attribute_idx).ok_or_else(|| {
            WeaveError::InvariantViolation(format!(
                "Class '{}': attribute index {} out of range",
                class.name, attribute_idx
            ))
        })?;
        let property = attribute.name.clone();
        let declared = attribute.ty.clone();
        let naming = self.config.naming;

        // A writer the classifier could not use (private, static, ...) owns
        // the name; generating next to it would clash.
        let writer = naming.writer(&property);
        if class.has_method(&writer, 1) {
            debug!(class = %class.name, property = %property, "writer name taken, not synthesizing");
            return Ok(PropertyAction::Disqualified {
                present: PresentAccessor::WriterOnly,
            });
        }

        let mut generated = Vec::new();
        let mut reader = None;
        let mut boolean_reader = None;

        if declared.name != self.config.void_type {
            let name = naming.reader(&property);
            if !class.has_method(&name, 0) {
                generated.push(self.reader(&name, &property, &declared));
                reader = Some(name);
            }
            if declared.is_one_of(&self.config.boolean_types) {
                let name = naming.boolean_reader(&property);
                if !class.has_method(&name, 0) {
                    generated.push(self.reader(&name, &property, &declared));
                    boolean_reader = Some(name);
                }
            }
        }

        generated.push(self.writer(&writer, &property, &declared));

        debug!(class = %class.name, property = %property, writer = %writer, "synthesized writer");
        class.methods.extend(generated);

        Ok(PropertyAction::Synthesized {
            reader,
            boolean_reader,
            writer,
        })
    }

    fn reader(&self, name: &str, property: &str, declared: &TypeRef) -> MethodDeclaration {
        MethodDeclaration::new(name)
            .returns(self.signature_type(declared))
            .annotated(GENERATED_MARKER)
            .body(vec![Statement::returning(Expr::field(property))])
    }

    fn writer(&self, name: &str, property: &str, declared: &TypeRef) -> MethodDeclaration {
        let call = InstrumentationCall::new(&self.config.instrumentation_method, property, WRITER_PARAM);
        MethodDeclaration::new(name)
            .param(WRITER_PARAM, self.signature_type(declared))
            .annotated(GENERATED_MARKER)
            .body(vec![
                call.to_statement(),
                Statement::assign_field(property, Expr::var(WRITER_PARAM)),
            ])
    }

    /// Primitives are value types and are reused as declared; everything
    /// else gets a fresh node per signature.
    fn signature_type(&self, declared: &TypeRef) -> TypeRef {
        if declared.is_one_of(&self.config.primitive_types) {
            declared.clone()
        } else {
            declared.structural_copy()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VoidPolicy;
    use crate::model::{AttributeDeclaration, GenericArg, Visibility};

    #[test]
    fn writer_body_marks_then_assigns() {
        let config = PassConfig::default();
        let mut class = ClassDefinition::new("Account")
            .attribute(AttributeDeclaration::new("balance", TypeRef::new("Decimal")));

        let action = AccessorSynthesizer::new(&config).synthesize(&mut class, 0).unwrap();

        assert_eq!(
            action,
            PropertyAction::Synthesized {
                reader: Some("getBalance".into()),
                boolean_reader: None,
                writer: "setBalance".into(),
            }
        );
        let writer = class.find_method("setBalance", 1).unwrap();
        let body = writer.body.as_ref().unwrap();
        assert_eq!(body.len(), 2);
        assert_eq!(body[0].to_string(), "this.markDirty(\"balance\", value)");
        assert_eq!(body[1].to_string(), "this.balance = value");
        assert_eq!(writer.return_type, None);
    }

    #[test]
    fn boolean_gets_both_reader_forms() {
        let config = PassConfig::default();
        let mut class = ClassDefinition::new("Account")
            .attribute(AttributeDeclaration::new("active", TypeRef::new("Boolean")));

        AccessorSynthesizer::new(&config).synthesize(&mut class, 0).unwrap();

        let get = class.find_method("getActive", 0).unwrap();
        let is = class.find_method("isActive", 0).unwrap();
        assert_eq!(get.body, is.body);
        assert_eq!(get.return_type, is.return_type);
    }

    #[test]
    fn generic_type_is_rebuilt_for_each_signature() {
        let config = PassConfig::default();
        let declared = TypeRef::new("Map")
            .with_args(vec![
                GenericArg::Concrete(TypeRef::new("String")),
                GenericArg::Wildcard {
                    upper: vec![],
                    lower: Some(TypeRef::new("Integer").at_line(4)),
                },
            ])
            .at_line(4);
        let mut class = ClassDefinition::new("Stats")
            .attribute(AttributeDeclaration::new("counts", declared.clone()));

        AccessorSynthesizer::new(&config).synthesize(&mut class, 0).unwrap();

        let reader = class.find_method("getCounts", 0).unwrap();
        let returned = reader.return_type.as_ref().unwrap();
        assert_eq!(returned, &declared);
        assert_eq!(returned.origin, None);
        assert_eq!(class.find_method("setCounts", 1).unwrap().params[0].ty, declared);
    }

    #[test]
    fn void_typed_attribute_only_gets_a_writer() {
        let config = PassConfig::default().void_policy(VoidPolicy::WriterOnly);
        let mut class = ClassDefinition::new("Odd")
            .attribute(AttributeDeclaration::new("nothing", TypeRef::new("void")));

        let action = AccessorSynthesizer::new(&config).synthesize(&mut class, 0).unwrap();

        assert!(matches!(action, PropertyAction::Synthesized { reader: None, .. }));
        assert_eq!(class.methods.len(), 1);
    }

    #[test]
    fn taken_writer_name_prevents_synthesis() {
        let config = PassConfig::default();
        let mut class = ClassDefinition::new("Account")
            .attribute(AttributeDeclaration::new("balance", TypeRef::new("Decimal")))
            .method(
                MethodDeclaration::new("setBalance")
                    .param("v", TypeRef::new("Decimal"))
                    .visibility(Visibility::Private),
            );

        let action = AccessorSynthesizer::new(&config).synthesize(&mut class, 0).unwrap();

        assert_eq!(
            action,
            PropertyAction::Disqualified {
                present: PresentAccessor::WriterOnly
            }
        );
        assert_eq!(class.methods.len(), 1);
    }

    #[test]
    fn missing_attribute_is_an_invariant_violation() {
        let config = PassConfig::default();
        let mut class = ClassDefinition::new("Empty");

        let err = AccessorSynthesizer::new(&config).synthesize(&mut class, 3).unwrap_err();
        assert!(matches!(err, WeaveError::InvariantViolation(_)));
    }
}
