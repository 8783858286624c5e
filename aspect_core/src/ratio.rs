// Copyright 2026 the Aspect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ratio application.
//!
//! The [`RatioLayer`] owns a side table of mounted elements (their parsed
//! dataset, group, and one-shot uniform flag) and turns resolved breakpoint
//! values into a single presentation write: the container's bottom padding,
//! which gives it an aspect ratio before its media has loaded.
//!
//! Hosts implement [`RatioHost`]. The DOM backend writes inline styles; tests
//! use an in-memory map.
//!
//! # Resolution mode
//!
//! Picture containers resolve mobile-first, because their breakpoints are
//! minimum render widths. Everything else resolves desktop-first against the
//! pixel-ratio-scaled viewport width.
//!
//! # Uniform groups
//!
//! Containers may share a [`GroupId`]. After the first real resize (tick
//! greater than 1) the first resolved ratio above the floor is broadcast on
//! the group's channel, and every member that has not been uniformed yet
//! adopts it and is marked [`UniformState::Uniformed`]. The flag never resets
//! for the lifetime of the mount, so each member snaps at most once, and a
//! uniformed member keeps the adopted ratio even when it has a dataset of its
//! own. This keeps a grid of same-style media from jumping while items of
//! different natural sizes load at different times.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::coordinator::{CallbackError, Tick};
use crate::dataset::{Ratio, RatioDataset};
use crate::element::{ElementId, ElementTable, GroupId};
use crate::resolve::{ResolveQuery, resolve};
use crate::trace::{RatioAppliedEvent, RatioSource, Tracer, UniformBroadcastEvent};
use crate::viewport::ViewportMetrics;

/// Writes ratios onto host elements.
pub trait RatioHost {
    /// Sets the element's inline bottom padding to `value` (e.g. `"56.25%"`).
    fn set_padding_bottom(&mut self, id: ElementId, value: &str);

    /// Returns whether the element already carries an inline bottom padding.
    fn has_inline_padding(&self, id: ElementId) -> bool;

    /// Returns whether the element is still part of the document.
    ///
    /// Detached elements are skipped by [`ratio_callback`] and unmounted by
    /// [`RatioRuntime`](crate::runtime::RatioRuntime) after the tick.
    fn is_attached(&self, id: ElementId) -> bool {
        _ = id;
        true
    }

    /// Drops whatever the host holds for an unmounted element.
    fn release(&mut self, id: ElementId) {
        _ = id;
    }
}

/// Ratio layer configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RatioConfig {
    /// Broadcast ratios must be strictly greater than this percentage.
    /// Smaller values indicate a bad read of a not-yet-laid-out container.
    pub uniform_floor: f64,
    /// Whether uniform broadcasts happen at all.
    pub uniform: bool,
}

impl RatioConfig {
    /// Uniform broadcasts enabled with a floor of 10%.
    pub const DEFAULT: Self = Self {
        uniform_floor: 10.0,
        uniform: true,
    };
}

impl Default for RatioConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Everything the rendering layer knows about a container when mounting it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MountSpec {
    /// Breakpoint ratios, possibly empty.
    pub dataset: RatioDataset,
    /// Uniform group, if the container belongs to one.
    pub group: Option<GroupId>,
    /// Whether the container wraps a picture element.
    pub picture: bool,
    /// Static ratio used when the dataset is empty.
    pub fallback: Option<Ratio>,
}

/// One-shot uniform flag of a mounted element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UniformState {
    /// Has not adopted a group broadcast yet.
    #[default]
    NotYetUniformed,
    /// Adopted a group broadcast; never reverts.
    Uniformed,
}

/// Side-table record for a mounted element.
#[derive(Clone, Debug, PartialEq)]
pub struct RegisteredElement {
    dataset: RatioDataset,
    group: Option<GroupId>,
    picture: bool,
    fallback: Option<Ratio>,
    uniform: UniformState,
    adopted: Option<Ratio>,
}

impl RegisteredElement {
    /// The dataset parsed at mount time.
    #[must_use]
    pub fn dataset(&self) -> &RatioDataset {
        &self.dataset
    }

    /// The element's uniform group.
    #[must_use]
    pub fn group(&self) -> Option<GroupId> {
        self.group
    }

    /// Whether the element resolves mobile-first.
    #[must_use]
    pub fn is_picture(&self) -> bool {
        self.picture
    }

    /// The static fallback ratio.
    #[must_use]
    pub fn fallback(&self) -> Option<Ratio> {
        self.fallback
    }

    /// The element's uniform flag.
    #[must_use]
    pub fn uniform_state(&self) -> UniformState {
        self.uniform
    }

    /// The group ratio the element adopted, once uniformed.
    #[must_use]
    pub fn adopted_ratio(&self) -> Option<Ratio> {
        self.adopted
    }
}

/// A uniform broadcast on a group channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniformSignal {
    /// The group being sized.
    pub group: GroupId,
    /// The ratio members should adopt.
    pub ratio: Ratio,
    /// The tick the broadcast happened in.
    pub tick: Tick,
}

/// In-process publish/subscribe channel keyed by [`GroupId`].
#[derive(Clone, Debug, Default)]
pub struct GroupChannel {
    members: BTreeMap<GroupId, Vec<ElementId>>,
}

impl GroupChannel {
    /// Creates a channel with no subscribers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            members: BTreeMap::new(),
        }
    }

    /// Subscribes `id` to `group`. Subscribing twice has no effect.
    pub fn subscribe(&mut self, group: GroupId, id: ElementId) {
        let members = self.members.entry(group).or_default();
        if !members.contains(&id) {
            members.push(id);
        }
    }

    /// Removes `id` from `group`.
    pub fn unsubscribe(&mut self, group: GroupId, id: ElementId) {
        if let Some(members) = self.members.get_mut(&group) {
            members.retain(|m| *m != id);
            if members.is_empty() {
                self.members.remove(&group);
            }
        }
    }

    /// The current subscribers of `group`, in subscription order.
    #[must_use]
    pub fn members(&self, group: GroupId) -> &[ElementId] {
        self.members.get(&group).map_or(&[], Vec::as_slice)
    }

    /// Offers `signal` to every subscriber of its group. `deliver` returns
    /// whether the subscriber acted on it; the count of those is returned.
    pub fn publish(
        &self,
        signal: &UniformSignal,
        mut deliver: impl FnMut(ElementId, &UniformSignal) -> bool,
    ) -> usize {
        self.members(signal.group)
            .iter()
            .filter(|id| deliver(**id, signal))
            .count()
    }
}

/// Why a ratio callback could not run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RatioError {
    /// The layer or host was already borrowed (a callback re-entered it).
    Busy,
    /// The element was unmounted but its coordinator registration remained.
    StaleElement(ElementId),
}

impl fmt::Display for RatioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => f.write_str("ratio layer is already in use"),
            Self::StaleElement(id) => write!(f, "{id:?} is no longer mounted"),
        }
    }
}

impl core::error::Error for RatioError {}

/// Applies resolved ratios to mounted elements.
#[derive(Clone, Debug, Default)]
pub struct RatioLayer {
    config: RatioConfig,
    elements: ElementTable<RegisteredElement>,
    channel: GroupChannel,
}

impl RatioLayer {
    /// Creates an empty layer.
    #[must_use]
    pub const fn new(config: RatioConfig) -> Self {
        Self {
            config,
            elements: ElementTable::new(),
            channel: GroupChannel::new(),
        }
    }

    /// The layer's configuration.
    #[must_use]
    pub fn config(&self) -> &RatioConfig {
        &self.config
    }

    /// Records a container and returns its handle. Nothing is written to the
    /// host until [`apply_ratio`](Self::apply_ratio) runs.
    pub fn mount(&mut self, spec: MountSpec) -> ElementId {
        let group = spec.group;
        let id = self.elements.insert(RegisteredElement {
            dataset: spec.dataset,
            group,
            picture: spec.picture,
            fallback: spec.fallback,
            uniform: UniformState::NotYetUniformed,
            adopted: None,
        });
        if let Some(group) = group {
            self.channel.subscribe(group, id);
        }
        id
    }

    /// Forgets a container. Returns `false` for stale handles.
    pub fn unmount(&mut self, id: ElementId) -> bool {
        let Some(element) = self.elements.remove(id) else {
            return false;
        };
        if let Some(group) = element.group {
            self.channel.unsubscribe(group, id);
        }
        true
    }

    /// Forgets every container.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.channel = GroupChannel::new();
    }

    /// Returns whether `id` is mounted.
    #[must_use]
    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.is_alive(id)
    }

    /// The side-table record for `id`.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&RegisteredElement> {
        self.elements.get(id)
    }

    /// Handles of every mounted container.
    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.elements.iter().map(|(id, _)| id)
    }

    /// Members of a uniform group.
    #[must_use]
    pub fn group_members(&self, group: GroupId) -> &[ElementId] {
        self.channel.members(group)
    }

    /// Number of mounted containers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if nothing is mounted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Resolves the element's dataset against `metrics` and writes the
    /// result, then offers it to the element's group.
    ///
    /// With an empty dataset the static fallback is written instead, but
    /// only when the element has no inline padding yet. Uniformed elements
    /// keep their adopted ratio and are not written again. Returns the ratio
    /// that was written, if any.
    pub fn apply_ratio(
        &mut self,
        host: &mut dyn RatioHost,
        id: ElementId,
        metrics: &ViewportMetrics,
        tick: Tick,
        tracer: &mut Tracer<'_>,
    ) -> Option<Ratio> {
        let element = self.elements.get(id)?;
        if element.uniform == UniformState::Uniformed {
            return None;
        }

        if element.dataset.is_empty() {
            let fallback = element.fallback?;
            if host.has_inline_padding(id) {
                return None;
            }
            host.set_padding_bottom(id, &fallback.to_string());
            tracer.ratio_applied(&RatioAppliedEvent {
                tick,
                element: id,
                ratio: fallback,
                source: RatioSource::Fallback,
            });
            return Some(fallback);
        }

        let query = ResolveQuery::from_metrics(metrics, element.picture);
        let ratio = *resolve(&element.dataset, &query)?;
        let group = element.group;

        host.set_padding_bottom(id, &ratio.to_string());
        tracer.ratio_applied(&RatioAppliedEvent {
            tick,
            element: id,
            ratio,
            source: RatioSource::Resolved,
        });

        if let Some(group) = group {
            self.broadcast_uniform(host, group, ratio, tick, tracer);
        }
        Some(ratio)
    }

    /// Offers `ratio` to every member of `group` that has not been uniformed.
    ///
    /// Does nothing on the initial paint (`tick <= 1`), when `ratio` is not
    /// above the configured floor, or when uniforming is disabled. Each
    /// member that adopts the ratio gets it written and is flagged
    /// [`UniformState::Uniformed`]. Returns how many members adopted it.
    pub fn broadcast_uniform(
        &mut self,
        host: &mut dyn RatioHost,
        group: GroupId,
        ratio: Ratio,
        tick: Tick,
        tracer: &mut Tracer<'_>,
    ) -> usize {
        if !self.config.uniform
            || tick.is_initial()
            || ratio.percent() <= self.config.uniform_floor
        {
            return 0;
        }

        let signal = UniformSignal { group, ratio, tick };
        let css = ratio.to_string();
        let elements = &mut self.elements;
        let notified = self.channel.publish(&signal, |member, signal| {
            let Some(element) = elements.get_mut(member) else {
                return false;
            };
            if element.uniform == UniformState::Uniformed {
                return false;
            }
            element.uniform = UniformState::Uniformed;
            element.adopted = Some(signal.ratio);
            host.set_padding_bottom(member, &css);
            tracer.ratio_applied(&RatioAppliedEvent {
                tick: signal.tick,
                element: member,
                ratio: signal.ratio,
                source: RatioSource::Uniform,
            });
            true
        });

        if notified > 0 {
            tracer.uniform_broadcast(&UniformBroadcastEvent {
                tick,
                group,
                ratio,
                notified,
            });
        }
        notified
    }
}

/// Adapts a shared layer and host into a coordinator callback keyed by
/// [`ElementId`].
///
/// The callback fails with [`RatioError::Busy`] if the layer or host is
/// already borrowed, and with [`RatioError::StaleElement`] if the element
/// was unmounted without being unregistered.
pub fn ratio_callback<H: RatioHost + 'static>(
    layer: Rc<RefCell<RatioLayer>>,
    host: Rc<RefCell<H>>,
) -> impl FnMut(&ElementId, &ViewportMetrics, Tick, &mut Tracer<'_>) -> Result<(), CallbackError> {
    move |id, metrics, tick, tracer| {
        let mut layer = layer.try_borrow_mut().map_err(|_| RatioError::Busy)?;
        let mut host = host.try_borrow_mut().map_err(|_| RatioError::Busy)?;
        if !layer.contains(*id) {
            return Err(RatioError::StaleElement(*id).into());
        }
        if !host.is_attached(*id) {
            return Ok(());
        }
        layer.apply_ratio(&mut *host, *id, metrics, tick, tracer);
        Ok(())
    }
}
