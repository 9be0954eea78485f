use serde::Serialize;

/// Why a declared attribute never takes part in tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NotPublic,
    Static,
    Transient,
    Final,
    Identity,
    Version,
    Configurational,
    VoidTyped,
}

/// The accessor that was found when the other one is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentAccessor {
    ReaderOnly,
    WriterOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PropertyAction {
    Skipped {
        reason: SkipReason,
    },
    Disqualified {
        present: PresentAccessor,
    },
    Synthesized {
        reader: Option<String>,
        boolean_reader: Option<String>,
        writer: String,
    },
    Woven {
        writer: String,
    },
    /// The writer already starts with the instrumentation call.
    AlreadyWoven {
        writer: String,
    },
    /// The writer carries the raw persistence accessor marker.
    Exempt {
        writer: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyOutcome {
    pub property: String,
    /// `false` for properties discovered only through an accessor pair.
    pub declared: bool,
    #[serde(flatten)]
    pub action: PropertyAction,
}

impl PropertyOutcome {
    pub fn is_instrumented(&self) -> bool {
        matches!(
            self.action,
            PropertyAction::Synthesized { .. }
                | PropertyAction::Woven { .. }
                | PropertyAction::AlreadyWoven { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateOutcome {
    /// Capability marker added by this run.
    Attached,
    /// The class lists the capability itself.
    AlreadyPresent,
    /// Assumed to come from a user-defined ancestor.
    Inherited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotProcessed {
    NotAModelClass,
    ExemptArtefact,
}

/// Summary of what one run did to one class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassReport {
    pub class_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate: Option<GateOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_processed: Option<NotProcessed>,
    pub composed: bool,
    pub properties: Vec<PropertyOutcome>,
}

impl ClassReport {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            gate: None,
            not_processed: None,
            composed: false,
            properties: Vec::new(),
        }
    }

    pub fn not_processed(class_name: impl Into<String>, reason: NotProcessed) -> Self {
        Self {
            not_processed: Some(reason),
            ..Self::new(class_name)
        }
    }

    pub fn outcome(&self, property: &str) -> Option<&PropertyOutcome> {
        self.properties
            .iter()
            .find(|outcome| outcome.property == property)
    }

    pub fn instrumented(&self) -> impl Iterator<Item = &PropertyOutcome> {
        self.properties.iter().filter(|outcome| outcome.is_instrumented())
    }
}
