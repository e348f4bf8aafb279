use std::collections::HashSet;

use crate::step::SagaStep;

/// An ordered, non-empty list of steps ready for orchestration.
pub struct Saga<C> {
    steps: Vec<Box<dyn SagaStep<Context = C>>>,
}

impl<C> Saga<C> {
    pub(crate) fn steps(&self) -> &[Box<dyn SagaStep<Context = C>>] {
        &self.steps
    }

    pub(crate) fn step_named(&self, name: &str) -> Option<&dyn SagaStep<Context = C>> {
        self.steps
            .iter()
            .find(|step| step.name() == name)
            .map(AsRef::as_ref)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step names in execution order.
    #[must_use]
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name()).collect()
    }
}

/// Builder for [`Saga`] values.
#[derive(Default)]
pub struct SagaBuilder<C> {
    steps: Vec<Box<dyn SagaStep<Context = C>>>,
}

impl<C> SagaBuilder<C> {
    #[must_use]
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step. Steps run in the order they are added.
    #[must_use]
    pub fn step<S>(mut self, step: S) -> Self
    where
        S: SagaStep<Context = C> + 'static,
    {
        self.steps.push(Box::new(step));
        self
    }

    /// Build the saga.
    ///
    /// # Panics
    ///
    /// Panics on an empty saga or duplicate step names. Both are
    /// programmer errors in the saga definition, not runtime conditions.
    #[must_use]
    pub fn build(self) -> Saga<C> {
        assert!(!self.steps.is_empty(), "a saga must have at least one step");
        let mut names = HashSet::new();
        for step in &self.steps {
            assert!(
                names.insert(step.name()),
                "duplicate step name '{}' in saga definition",
                step.name()
            );
        }
        Saga { steps: self.steps }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::StepError;

    struct NamedStep(&'static str);

    impl SagaStep for NamedStep {
        type Context = ();

        fn name(&self) -> &'static str {
            self.0
        }

        fn forward(&self, (): &()) -> Result<(), StepError> {
            Ok(())
        }
    }

    #[test]
    fn builder_preserves_step_order() {
        let saga = SagaBuilder::new()
            .step(NamedStep("first"))
            .step(NamedStep("second"))
            .build();
        assert_eq!(saga.step_names(), ["first", "second"]);
        assert_eq!(saga.len(), 2);
    }

    #[test]
    fn step_named_finds_steps() {
        let saga = SagaBuilder::new().step(NamedStep("only")).build();
        assert!(saga.step_named("only").is_some());
        assert!(saga.step_named("other").is_none());
    }

    #[test]
    #[should_panic(expected = "at least one step")]
    fn empty_saga_does_not_build() {
        let _ = SagaBuilder::<()>::new().build();
    }

    #[test]
    #[should_panic(expected = "duplicate step name")]
    fn duplicate_names_do_not_build() {
        let _ = SagaBuilder::new()
            .step(NamedStep("twice"))
            .step(NamedStep("twice"))
            .build();
    }
}
