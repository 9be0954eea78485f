use super::naming::AccessorKind;
use super::report::{PresentAccessor, SkipReason};
use crate::config::{ConfigurationalNames, PassConfig, VoidPolicy};
use crate::model::{AttributeDeclaration, ClassDefinition, MethodDeclaration};
use std::collections::{HashMap, HashSet};

/// Reader and writer found for one property name, as method indices into
/// the class being classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessorPair {
    pub reader: Option<usize>,
    pub boolean_reader: Option<usize>,
    pub writer: Option<usize>,
}

impl AccessorPair {
    pub fn has_reader(&self) -> bool {
        self.reader.is_some() || self.boolean_reader.is_some()
    }

    pub fn has_both(&self) -> bool {
        self.has_reader() && self.writer.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_reader() && self.writer.is_none()
    }

    /// Drops the `is` reader unless the property is boolean-typed.
    fn for_type(mut self, is_boolean: bool) -> Self {
        if !is_boolean {
            self.boolean_reader = None;
        }
        self
    }

    fn present(&self) -> Option<PresentAccessor> {
        match (self.has_reader(), self.writer.is_some()) {
            (true, false) => Some(PresentAccessor::ReaderOnly),
            (false, true) => Some(PresentAccessor::WriterOnly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Skip(SkipReason),
    Synthesize { attribute: usize },
    Weave { writer: usize },
    Disqualify(PresentAccessor),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub property: String,
    pub declared: bool,
    pub decision: Decision,
}

/// Accessor pairs keyed by property name, in order of first appearance.
#[derive(Debug, Default)]
struct PairTable {
    order: Vec<String>,
    pairs: HashMap<String, AccessorPair>,
}

impl PairTable {
    fn slot(&mut self, property: &str) -> &mut AccessorPair {
        if !self.pairs.contains_key(property) {
            self.order.push(property.to_string());
        }
        self.pairs.entry(property.to_string()).or_default()
    }

    fn get(&self, property: &str) -> AccessorPair {
        self.pairs.get(property).copied().unwrap_or_default()
    }
}

pub struct MemberClassifier<'a> {
    config: &'a PassConfig,
    reserved: &'a ConfigurationalNames,
}

impl<'a> MemberClassifier<'a> {
    pub fn new(config: &'a PassConfig, reserved: &'a ConfigurationalNames) -> Self {
        Self { config, reserved }
    }

    /// One decision per declared attribute, followed by decisions for
    /// accessor-only (virtual) properties.
    pub fn classify(&self, class: &ClassDefinition) -> Vec<Classification> {
        let pairs = self.collect_pairs(class);
        let mut decisions = Vec::new();
        let mut claimed = HashSet::new();

        for (idx, attribute) in class.attributes.iter().enumerate() {
            let pair = pairs
                .get(&attribute.name)
                .for_type(attribute.ty.is_one_of(&self.config.boolean_types));
            let decision = match self.skip_reason(attribute) {
                // A non-public backing field is not a property by itself; a
                // complete public accessor pair still makes it one.
                Some(SkipReason::NotPublic) if pair.has_both() => continue,
                Some(reason) => Decision::Skip(reason),
                None => self.decide_declared(idx, attribute, pair),
            };
            claimed.insert(attribute.name.as_str());
            decisions.push(Classification {
                property: attribute.name.clone(),
                declared: true,
                decision,
            });
        }

        for property in &pairs.order {
            if claimed.contains(property.as_str()) {
                continue;
            }
            let pair = pairs.get(property);
            let pair = pair.for_type(self.writes_boolean(class, pair));
            let decision = if let Some(reason) = self.reserved_reason(property) {
                Decision::Skip(reason)
            } else if let (true, Some(writer)) = (pair.has_both(), pair.writer) {
                Decision::Weave { writer }
            } else if let Some(present) = pair.present() {
                Decision::Disqualify(present)
            } else {
                continue;
            };
            decisions.push(Classification {
                property: property.clone(),
                declared: class.find_attribute(property).is_some(),
                decision,
            });
        }

        decisions
    }

    fn decide_declared(
        &self,
        idx: usize,
        attribute: &AttributeDeclaration,
        pair: AccessorPair,
    ) -> Decision {
        if pair.is_empty() {
            if attribute.ty.name == self.config.void_type {
                return match self.config.void_policy {
                    VoidPolicy::Disqualify => Decision::Skip(SkipReason::VoidTyped),
                    VoidPolicy::WriterOnly => Decision::Synthesize { attribute: idx },
                };
            }
            return Decision::Synthesize { attribute: idx };
        }
        match (pair.has_both(), pair.writer, pair.present()) {
            (true, Some(writer), _) => Decision::Weave { writer },
            (_, _, Some(present)) => Decision::Disqualify(present),
            _ => Decision::Synthesize { attribute: idx },
        }
    }

    fn skip_reason(&self, attribute: &AttributeDeclaration) -> Option<SkipReason> {
        let modifiers = attribute.modifiers;
        if !attribute.visibility.is_public() {
            return Some(SkipReason::NotPublic);
        }
        if modifiers.is_static {
            return Some(SkipReason::Static);
        }
        if modifiers.is_transient || attribute.has_annotation(&self.config.transient_marker) {
            return Some(SkipReason::Transient);
        }
        if modifiers.is_final {
            return Some(SkipReason::Final);
        }
        self.reserved_reason(&attribute.name)
    }

    fn reserved_reason(&self, name: &str) -> Option<SkipReason> {
        if name == self.config.identity_property {
            Some(SkipReason::Identity)
        } else if name == self.config.version_property {
            Some(SkipReason::Version)
        } else if self.reserved.matches(name) {
            Some(SkipReason::Configurational)
        } else {
            None
        }
    }

    fn collect_pairs(&self, class: &ClassDefinition) -> PairTable {
        let mut table = PairTable::default();
        for (idx, method) in class.methods.iter().enumerate() {
            if !method.is_accessor_candidate() {
                continue;
            }
            let Some((kind, property)) = self.config.naming.parse(&method.name) else {
                continue;
            };
            if self.reserved.matches(&property) || !self.has_accessor_shape(method, kind) {
                continue;
            }
            let slot = table.slot(&property);
            let target = match kind {
                AccessorKind::Reader => &mut slot.reader,
                AccessorKind::BooleanReader => &mut slot.boolean_reader,
                AccessorKind::Writer => &mut slot.writer,
            };
            // overloads: the first declaration wins
            if target.is_none() {
                *target = Some(idx);
            }
        }
        table
    }

    fn has_accessor_shape(&self, method: &MethodDeclaration, kind: AccessorKind) -> bool {
        match kind {
            AccessorKind::Reader => method.arity() == 0 && self.returns_value(method),
            AccessorKind::BooleanReader => {
                method.arity() == 0
                    && method
                        .return_type
                        .as_ref()
                        .is_some_and(|ty| ty.is_one_of(&self.config.boolean_types))
            }
            AccessorKind::Writer => method.arity() == 1,
        }
    }

    /// Without a writer the `is` reader is the only hint at the type.
    fn writes_boolean(&self, class: &ClassDefinition, pair: AccessorPair) -> bool {
        match pair.writer {
            Some(writer) => class.methods[writer]
                .params
                .first()
                .is_some_and(|param| param.ty.is_one_of(&self.config.boolean_types)),
            None => true,
        }
    }

    fn returns_value(&self, method: &MethodDeclaration) -> bool {
        method
            .return_type
            .as_ref()
            .is_some_and(|ty| ty.name != self.config.void_type)
    }
}
