use crate::model::{AttributeDeclaration, ClassDefinition, MethodDeclaration, Modifiers, Visibility};
use std::fmt;

const INDENT: &str = "  ";

impl fmt::Display for ClassDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for annotation in &self.annotations {
            writeln!(f, "@{}", annotation)?;
        }
        write!(f, "class {}", self.name)?;
        if let Some(ancestor) = &self.ancestor {
            write!(f, " extends {}", ancestor)?;
        }
        if !self.capabilities.is_empty() {
            let list = self
                .capabilities
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, " implements {}", list)?;
        }
        writeln!(f, " {{")?;

        for attribute in &self.attributes {
            writeln!(f, "{}{}", INDENT, attribute)?;
        }
        for method in &self.methods {
            write!(f, "{}", RenderedMethod(method))?;
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for AttributeDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_prefix(f, &self.annotations, self.visibility, self.modifiers)?;
        write!(f, "property {}: {}", self.name, self.ty)
    }
}

/// A method line (plus body lines) at member indentation.
struct RenderedMethod<'a>(&'a MethodDeclaration);

impl fmt::Display for RenderedMethod<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let method = self.0;
        f.write_str(INDENT)?;
        write_prefix(f, &method.annotations, method.visibility, method.modifiers)?;
        write!(f, "method {}(", method.name)?;
        for (idx, param) in method.params.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", param.name, param.ty)?;
        }
        write!(f, ")")?;
        if let Some(ret) = &method.return_type {
            write!(f, ": {}", ret)?;
        }

        match method.body.as_deref() {
            None => writeln!(f),
            Some([]) => writeln!(f, " {{}}"),
            Some([single]) => writeln!(f, " {{ {} }}", single),
            Some(statements) => {
                writeln!(f, " {{")?;
                for statement in statements {
                    writeln!(f, "{}{}{}", INDENT, INDENT, statement)?;
                }
                writeln!(f, "{}}}", INDENT)
            }
        }
    }
}

fn write_prefix(
    f: &mut fmt::Formatter<'_>,
    annotations: &[String],
    visibility: Visibility,
    modifiers: Modifiers,
) -> fmt::Result {
    for annotation in annotations {
        write!(f, "@{} ", annotation)?;
    }
    if !visibility.is_public() {
        write!(f, "{} ", visibility)?;
    }
    let flags = [
        (modifiers.is_static, "static"),
        (modifiers.is_final, "final"),
        (modifiers.is_transient, "transient"),
        (modifiers.is_abstract, "abstract"),
        (modifiers.is_synthetic, "synthetic"),
    ];
    for (_, keyword) in flags.iter().filter(|(set, _)| *set) {
        write!(f, "{} ", keyword)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::model::{
        AttributeDeclaration, ClassDefinition, Expr, MethodDeclaration, Modifiers, Statement,
        TypeRef, Visibility,
    };

    #[test]
    fn renders_members_in_declaration_order() {
        let class = ClassDefinition::new("Account")
            .annotated("Entity")
            .extends(TypeRef::new("Object"))
            .attribute(AttributeDeclaration::new("balance", TypeRef::new("BigDecimal")))
            .attribute(
                AttributeDeclaration::new("cache", TypeRef::new("String"))
                    .visibility(Visibility::Private)
                    .modifiers(Modifiers {
                        is_transient: true,
                        ..Modifiers::none()
                    }),
            )
            .method(
                MethodDeclaration::new("setBalance")
                    .param("value", TypeRef::new("BigDecimal"))
                    .body(vec![
                        Statement::expr(Expr::call(
                            "markDirty",
                            vec![Expr::string("balance"), Expr::var("value")],
                        )),
                        Statement::assign_field("balance", Expr::var("value")),
                    ]),
            );

        let expected = "\
@Entity
class Account extends Object {
  property balance: BigDecimal
  private transient property cache: String
  method setBalance(value: BigDecimal) {
    this.markDirty(\"balance\", value)
    this.balance = value
  }
}
";
        assert_eq!(class.to_string(), expected);
    }
}
