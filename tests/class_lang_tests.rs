use dirtyweave::pass::NotProcessed;
use dirtyweave::{
    AnnotationClassifier, ClassProgram, DefaultMethodBundle, GateOutcome, PassConfig,
    PropertyAction, Result, WeaveError, weave_source,
};

const BANK: &str = r#"
    @Entity
    class Account extends Object implements Serializable {
      property id: Long
      property version: Long
      property balance: BigDecimal
      property active: boolean
      property tags: List<? extends CharSequence>
      private property secret: String
      method getOwner(): String { return this.owner }
      method setOwner(value: String) {
        this.owner = value
        this.audit("owner", value)
      }
      method getName(): String { return this.name }
    }

    @Entity
    class SavingsAccount extends Account {
      property rate: double
    }

    class AuditLog {
      property lines: List<String>
    }
"#;

#[test]
fn transforms_a_class_program() -> Result<()> {
    let mut bundle = DefaultMethodBundle::new();
    let (program, reports) = weave_source(
        BANK,
        PassConfig::default(),
        &AnnotationClassifier::new(),
        Some(&mut bundle),
    )?;

    assert_eq!(reports.len(), 3);
    assert_eq!(reports[0].gate, Some(GateOutcome::Attached));
    assert_eq!(reports[1].gate, Some(GateOutcome::Inherited));
    assert_eq!(reports[2].not_processed, Some(NotProcessed::NotAModelClass));
    assert_eq!(bundle.composed_classes(), &["Account".to_string()]);

    let rendered = program.render();
    assert!(rendered.contains("class Account extends Object implements Serializable, DirtyCheckable {"));
    assert!(rendered.contains("@Generated method getBalance(): BigDecimal { return this.balance }"));
    assert!(rendered.contains(
        "  @Generated method setBalance(value: BigDecimal) {\n    this.markDirty(\"balance\", value)\n    this.balance = value\n  }"
    ));
    assert!(rendered.contains("@Generated method isActive(): boolean { return this.active }"));
    assert!(rendered.contains("@Generated method getTags(): List<? extends CharSequence>"));
    assert!(rendered.contains(
        "  method setOwner(value: String) {\n    this.markDirty(\"owner\", value)\n    this.owner = value\n    this.audit(\"owner\", value)\n  }"
    ));
    assert!(rendered.contains("private transient property $changedProperties: Map<String, Object>"));
    assert!(!rendered.contains("setId"));
    assert!(!rendered.contains("setVersion"));
    assert!(!rendered.contains("setName"));
    assert!(!rendered.contains("setSecret"));
    assert!(rendered.contains("class SavingsAccount extends Account {\n  property rate: double"));
    assert!(rendered.contains("method setRate(value: double)"));
    assert!(rendered.contains("class AuditLog {\n  property lines: List<String>\n}"));

    let account = &reports[0];
    let instrumented: Vec<&str> = account
        .instrumented()
        .map(|outcome| outcome.property.as_str())
        .collect();
    assert_eq!(instrumented, vec!["balance", "active", "tags", "owner"]);
    assert!(matches!(
        account.outcome("name").map(|o| &o.action),
        Some(PropertyAction::Disqualified { .. })
    ));
    Ok(())
}

#[test]
fn rerunning_on_rendered_output_is_a_no_op() -> Result<()> {
    let classifier = AnnotationClassifier::new();
    let (first, _) = weave_source(
        BANK,
        PassConfig::default(),
        &classifier,
        Some(&mut DefaultMethodBundle::new()),
    )?;
    let once = first.render();

    let (second, reports) = weave_source(
        &once,
        PassConfig::default(),
        &classifier,
        Some(&mut DefaultMethodBundle::new()),
    )?;

    assert_eq!(second.render(), once);
    assert_eq!(reports[0].gate, Some(GateOutcome::AlreadyPresent));
    assert!(!reports[0].composed);
    assert!(reports.iter().flat_map(|r| &r.properties).all(|outcome| !matches!(
        outcome.action,
        PropertyAction::Synthesized { .. } | PropertyAction::Woven { .. }
    )));
    Ok(())
}

#[test]
fn snake_case_naming_is_configurable() -> Result<()> {
    let source = "class Gauge {\n  property level: f64\n  property on: bool\n}\n";
    let (program, _) = weave_source(
        source,
        PassConfig::rust().capability("Tracked"),
        &dirtyweave::AllClasses,
        None,
    )?;

    let gauge = program.find("Gauge").unwrap();
    assert!(gauge.has_capability("Tracked"));
    assert!(gauge.has_method("get_level", 0));
    assert!(gauge.has_method("set_level", 1));
    assert!(gauge.has_method("is_on", 0));
    assert_eq!(
        gauge.find_method("set_on", 1).unwrap().body.as_ref().unwrap()[0].to_string(),
        "this.mark_dirty(\"on\", value)"
    );
    Ok(())
}

#[test]
fn parse_errors_surface_with_line_numbers() {
    let err = weave_source(
        "class Broken {\n  property ok: int\n  property bad: Map<String\n}\n",
        PassConfig::default(),
        &dirtyweave::AllClasses,
        None,
    )
    .unwrap_err();

    match err {
        WeaveError::ParseError(msg) => {
            assert!(msg.starts_with("Line 3"), "{}", msg);
            assert!(msg.contains("Map<String"), "{}", msg);
        }
        other => panic!("Expected parse error, got {:?}", other),
    }
}

#[test]
fn programs_look_up_classes_by_simple_name() -> Result<()> {
    let program = ClassProgram::parse("class com.acme.Order {\n}\n")?;
    assert!(program.find("Order").is_some());
    assert!(program.find("com.acme.Order").is_some());
    assert!(program.find("Invoice").is_none());
    Ok(())
}

#[test]
fn writers_with_nested_blocks_are_woven() -> Result<()> {
    let source = r#"
@Entity
class Customer {
  private property email: String
  method getEmail(): String { return this.email }
  method setEmail(value: String) {
    if (value != null) {
      this.email = value
    }
    this.notify("see https://example.org/email")
  }
}
"#;
    let (program, reports) = weave_source(
        source,
        PassConfig::default(),
        &AnnotationClassifier::new(),
        None,
    )?;

    assert!(matches!(
        reports[0].outcome("email").map(|o| &o.action),
        Some(PropertyAction::Woven { .. })
    ));
    let rendered = program.render();
    assert!(rendered.contains(
        "  method setEmail(value: String) {\n    this.markDirty(\"email\", value)\n    if (value != null) {\n      this.email = value\n    }\n    this.notify(\"see https://example.org/email\")\n  }"
    ));

    let (again, _) = weave_source(
        &rendered,
        PassConfig::default(),
        &AnnotationClassifier::new(),
        None,
    )?;
    assert_eq!(again.render(), rendered);
    Ok(())
}
