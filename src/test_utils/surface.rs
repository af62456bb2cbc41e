use std::collections::{BTreeMap, BTreeSet};

use crate::chart::{config::ChartConfig, factory::ChartSurface};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SurfaceEvent {
    Mount(String),
    Unmount(String),
    Clear(String),
}

/// A chart surface that records what the factory asked it to do.
#[derive(Default)]
pub(crate) struct RecordingSurface {
    targets: BTreeSet<String>,
    next_handle: u64,
    pub(crate) events: Vec<SurfaceEvent>,
    pub(crate) mounted: BTreeMap<String, ChartConfig>,
}

impl RecordingSurface {
    pub(crate) fn with_targets(targets: &[&str]) -> Self {
        Self {
            targets: targets.iter().map(|target| (*target).to_owned()).collect(),
            ..Default::default()
        }
    }

    pub(crate) fn live_count(&self) -> usize {
        self.mounted.len()
    }

    pub(crate) fn unmount_count(&self, target: &str) -> usize {
        self.events
            .iter()
            .filter(|event| **event == SurfaceEvent::Unmount(target.to_owned()))
            .count()
    }

    #[track_caller]
    pub(crate) fn config(&self, target: &str) -> &ChartConfig {
        self.mounted
            .get(target)
            .unwrap_or_else(|| panic!("no chart mounted on \"{target}\""))
    }
}

impl ChartSurface for RecordingSurface {
    type Handle = u64;

    fn has_target(&self, target: &str) -> bool {
        self.targets.contains(target)
    }

    fn mount(&mut self, target: &str, config: &ChartConfig) -> u64 {
        assert!(
            !self.mounted.contains_key(target),
            "\"{target}\" was mounted twice without being unmounted"
        );
        self.events.push(SurfaceEvent::Mount(target.to_owned()));
        self.mounted.insert(target.to_owned(), config.clone());
        self.next_handle += 1;
        self.next_handle
    }

    fn unmount(&mut self, target: &str, _handle: u64) {
        self.events.push(SurfaceEvent::Unmount(target.to_owned()));
        self.mounted.remove(target);
    }

    fn clear(&mut self, target: &str) {
        self.events.push(SurfaceEvent::Clear(target.to_owned()));
    }
}
