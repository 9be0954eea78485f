//! The dirty-tracking pass: gate, classify, then synthesize or weave.

pub mod classifier;
pub mod gate;
pub mod instrument;
pub mod naming;
pub mod report;
pub mod synthesizer;
pub mod weaver;

pub use classifier::{AccessorPair, Classification, Decision, MemberClassifier};
pub use instrument::InstrumentationCall;
pub use naming::AccessorKind;
pub use report::{
    ClassReport, GateOutcome, NotProcessed, PresentAccessor, PropertyAction, PropertyOutcome,
    SkipReason,
};
pub use synthesizer::{AccessorSynthesizer, GENERATED_MARKER, WRITER_PARAM};
pub use weaver::Weaver;

use crate::config::{ConfigurationalNames, PassConfig};
use crate::core::Result;
use crate::host::{CapabilityComposer, ModelClassifier};
use crate::model::ClassDefinition;
use tracing::{debug, info_span};

/// A configured dirty-tracking pass. Holds no per-class state: every run
/// re-derives its output from the class it is given.
#[derive(Debug, Clone)]
pub struct DirtyTrackingPass {
    config: PassConfig,
    reserved: ConfigurationalNames,
}

impl DirtyTrackingPass {
    pub fn new(config: PassConfig) -> Result<Self> {
        config.validate()?;
        let reserved = config.compile_configurational()?;
        Ok(Self { config, reserved })
    }

    pub fn config(&self) -> &PassConfig {
        &self.config
    }

    /// Decisions for `class` without touching it.
    pub fn classify(&self, class: &ClassDefinition) -> Vec<Classification> {
        MemberClassifier::new(&self.config, &self.reserved).classify(class)
    }

    /// Transforms one class in place.
    ///
    /// Member decisions are taken on the class as declared, before the gate
    /// attaches the capability, so composed members never get classified.
    pub fn transform(
        &self,
        class: &mut ClassDefinition,
        composer: Option<&mut (dyn CapabilityComposer + '_)>,
    ) -> Result<ClassReport> {
        let span = info_span!("dirty_tracking", class = %class.name);
        let _guard = span.enter();
        debug!("processing class {}", class.name);

        let decisions = self.classify(class);
        let (gate, composed) = gate::apply(class, &self.config, composer)?;

        let synthesizer = AccessorSynthesizer::new(&self.config);
        let weaver = Weaver::new(&self.config);
        let mut report = ClassReport::new(class.name.clone());
        report.gate = Some(gate);
        report.composed = composed;

        for Classification {
            property,
            declared,
            decision,
        } in decisions
        {
            let action = match decision {
                Decision::Skip(reason) => PropertyAction::Skipped { reason },
                Decision::Disqualify(present) => PropertyAction::Disqualified { present },
                Decision::Synthesize { attribute } => synthesizer.synthesize(class, attribute)?,
                Decision::Weave { writer } => weaver.weave(class, writer, &property)?,
            };
            report.properties.push(PropertyOutcome {
                property,
                declared,
                action,
            });
        }

        Ok(report)
    }

    /// Runs the pass over every class the classifier accepts; other classes
    /// are reported and left untouched.
    pub fn transform_all(
        &self,
        classes: &mut [ClassDefinition],
        classifier: &dyn ModelClassifier,
        mut composer: Option<&mut (dyn CapabilityComposer + '_)>,
    ) -> Result<Vec<ClassReport>> {
        let mut reports = Vec::with_capacity(classes.len());
        for class in classes.iter_mut() {
            if !classifier.is_model_class(class) {
                reports.push(ClassReport::not_processed(
                    class.name.clone(),
                    NotProcessed::NotAModelClass,
                ));
                continue;
            }
            if classifier.is_exempt(class) {
                reports.push(ClassReport::not_processed(
                    class.name.clone(),
                    NotProcessed::ExemptArtefact,
                ));
                continue;
            }
            reports.push(self.transform(class, composer.as_deref_mut())?);
        }
        Ok(reports)
    }
}
