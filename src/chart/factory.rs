//! Creates charts on a surface and owns their lifetime.

use crate::chart::{
    config::ChartConfig,
    registry::ChartRegistry,
    spec::{ChartKind, ChartOptions, ChartSpec},
};

/// Something charts can be drawn on, e.g. the chart containers of a page.
///
/// The surface also acts as the target resolver: the factory never mounts a
/// chart on a target the surface does not have.
pub trait ChartSurface {
    /// The live chart instance returned by [ChartSurface::mount].
    type Handle;

    /// Whether the surface has a drawing area with the identifier `target`.
    fn has_target(&self, target: &str) -> bool;

    /// Draw `config` on `target` and return a handle to the new instance.
    fn mount(&mut self, target: &str, config: &ChartConfig) -> Self::Handle;

    /// Free the resources held by the instance behind `handle`.
    fn unmount(&mut self, target: &str, handle: Self::Handle);

    /// Blank the drawing area of `target`.
    fn clear(&mut self, target: &str);
}

/// Builds kind specific chart configurations and keeps at most one live
/// chart per target.
pub struct ChartFactory<S: ChartSurface> {
    surface: S,
    registry: ChartRegistry<S::Handle>,
}

impl<S: ChartSurface> ChartFactory<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            registry: ChartRegistry::new(),
        }
    }

    /// Draw a `kind` chart of `spec` on `target`, replacing any chart already there.
    ///
    /// Returns `None` without touching the surface if `target` does not exist
    /// or there is no `spec` to draw.
    pub fn create(
        &mut self,
        kind: ChartKind,
        target: &str,
        spec: Option<ChartSpec>,
        options: ChartOptions,
    ) -> Option<&S::Handle> {
        if !self.surface.has_target(target) {
            tracing::debug!("skipping {kind} chart: no target \"{target}\" on the surface");
            return None;
        }

        let Some(spec) = spec else {
            tracing::debug!("skipping {kind} chart on \"{target}\": nothing to render");
            return None;
        };

        if !spec.is_aligned() {
            tracing::warn!(
                "{kind} chart on \"{target}\" has datasets that do not match its {} labels",
                spec.labels.len()
            );
        }

        self.destroy(target);

        let config = ChartConfig::build(kind, spec, options);
        let handle = self.surface.mount(target, &config);
        self.registry.acquire(target, handle);

        self.registry.get(target)
    }

    /// Destroy the chart on `target`, returning whether there was one.
    pub fn destroy(&mut self, target: &str) -> bool {
        match self.registry.release(target) {
            Some(handle) => {
                self.surface.unmount(target, handle);
                true
            }
            None => false,
        }
    }

    /// Destroy every chart this factory created.
    pub fn destroy_all(&mut self) {
        for (target, handle) in self.registry.drain() {
            self.surface.unmount(&target, handle);
        }
    }

    /// Destroy the chart on `target` and blank its drawing area.
    pub fn clear(&mut self, target: &str) {
        self.destroy(target);

        if self.surface.has_target(target) {
            self.surface.clear(target);
        }
    }

    pub fn is_live(&self, target: &str) -> bool {
        self.registry.contains(target)
    }

    pub fn registry(&self) -> &ChartRegistry<S::Handle> {
        &self.registry
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        chart::spec::{ChartKind, ChartOptions, ChartSpec, Dataset},
        test_utils::{RecordingSurface, SurfaceEvent},
    };

    use super::ChartFactory;

    fn spec(values: Vec<f64>) -> ChartSpec {
        let labels = (0..values.len()).map(|index| format!("L{index}")).collect();
        ChartSpec::new(labels, vec![Dataset::new("Values", values)])
    }

    #[test]
    fn create_returns_none_for_missing_target() {
        let mut factory = ChartFactory::new(RecordingSurface::with_targets(&["other"]));

        let handle = factory.create(
            ChartKind::Line,
            "cashFlowChart",
            Some(spec(vec![1.0])),
            ChartOptions::default(),
        );

        assert!(handle.is_none());
        assert!(factory.surface().events.is_empty());
        assert!(factory.registry().is_empty());
    }

    #[test]
    fn create_returns_none_for_missing_spec() {
        let mut factory = ChartFactory::new(RecordingSurface::with_targets(&["cashFlowChart"]));

        let handle = factory.create(
            ChartKind::Line,
            "cashFlowChart",
            None,
            ChartOptions::default(),
        );

        assert!(handle.is_none());
        assert!(factory.surface().events.is_empty());
    }

    #[test]
    fn create_twice_leaves_exactly_one_live_instance() {
        let mut factory = ChartFactory::new(RecordingSurface::with_targets(&["cashFlowChart"]));

        let first = factory
            .create(
                ChartKind::Line,
                "cashFlowChart",
                Some(spec(vec![1.0])),
                ChartOptions::default(),
            )
            .copied();
        let second = factory
            .create(
                ChartKind::Line,
                "cashFlowChart",
                Some(spec(vec![2.0])),
                ChartOptions::default(),
            )
            .copied();

        assert_ne!(first, second);
        assert_eq!(factory.registry().len(), 1);
        assert_eq!(factory.surface().live_count(), 1);
        assert_eq!(
            factory.surface().events,
            vec![
                SurfaceEvent::Mount("cashFlowChart".to_owned()),
                SurfaceEvent::Unmount("cashFlowChart".to_owned()),
                SurfaceEvent::Mount("cashFlowChart".to_owned()),
            ]
        );
        assert_eq!(factory.surface().unmount_count("cashFlowChart"), 1);
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut factory = ChartFactory::new(RecordingSurface::with_targets(&["cashFlowChart"]));
        factory.create(
            ChartKind::Line,
            "cashFlowChart",
            Some(spec(vec![1.0])),
            ChartOptions::default(),
        );

        assert!(factory.destroy("cashFlowChart"));
        assert!(!factory.destroy("cashFlowChart"));
        assert!(!factory.destroy("neverCreated"));
        assert_eq!(factory.surface().unmount_count("cashFlowChart"), 1);
        assert_eq!(factory.surface().live_count(), 0);
    }

    #[test]
    fn destroy_all_releases_every_instance() {
        let mut factory = ChartFactory::new(RecordingSurface::with_targets(&["a", "b"]));
        for target in ["a", "b"] {
            factory.create(
                ChartKind::Bar,
                target,
                Some(spec(vec![1.0])),
                ChartOptions::default(),
            );
        }

        factory.destroy_all();

        assert!(factory.registry().is_empty());
        assert_eq!(factory.surface().live_count(), 0);
        assert_eq!(factory.surface().unmount_count("a"), 1);
        assert_eq!(factory.surface().unmount_count("b"), 1);
    }

    #[test]
    fn clear_destroys_and_blanks_target() {
        let mut factory = ChartFactory::new(RecordingSurface::with_targets(&["a"]));
        factory.create(
            ChartKind::Doughnut,
            "a",
            Some(spec(vec![1.0])),
            ChartOptions::default(),
        );

        factory.clear("a");

        assert!(!factory.is_live("a"));
        assert_eq!(
            factory.surface().events.last(),
            Some(&SurfaceEvent::Clear("a".to_owned()))
        );
    }

    #[test]
    fn misaligned_spec_is_still_rendered() {
        let mut factory = ChartFactory::new(RecordingSurface::with_targets(&["a"]));
        let misaligned = ChartSpec::new(vec![], vec![Dataset::new("Values", vec![1.0])]);

        let handle = factory.create(
            ChartKind::Line,
            "a",
            Some(misaligned),
            ChartOptions::default(),
        );

        assert!(handle.is_some());
    }
}
