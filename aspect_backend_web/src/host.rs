// Copyright 2026 the Aspect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM ratio host.
//!
//! Maps [`ElementId`] handles to live container elements and writes ratios
//! as inline `padding-bottom` styles. An element counts as attached while it
//! is connected to a document.

use alloc::vec::Vec;

use aspect_core::element::ElementId;
use aspect_core::ratio::RatioHost;
use web_sys::HtmlElement;

const PADDING_BOTTOM: &str = "padding-bottom";

/// Container elements indexed by [`ElementId`] slot.
///
/// Slots remember the full handle, so a stale handle whose slot has been
/// reused never reaches the newer element.
#[derive(Default)]
pub struct DomRatioHost {
    elements: Vec<Option<(ElementId, HtmlElement)>>,
}

impl core::fmt::Debug for DomRatioHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomRatioHost")
            .field("attached", &self.elements.iter().flatten().count())
            .finish_non_exhaustive()
    }
}

impl DomRatioHost {
    /// Creates a host with no attached elements.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates `el` with `id`, replacing whatever occupied the slot.
    pub fn attach(&mut self, id: ElementId, el: HtmlElement) {
        let slot = id.index() as usize;
        if self.elements.len() <= slot {
            self.elements.resize_with(slot + 1, || None);
        }
        self.elements[slot] = Some((id, el));
    }

    /// Removes and returns the element attached to `id`.
    pub fn detach(&mut self, id: ElementId) -> Option<HtmlElement> {
        let slot = self.elements.get_mut(id.index() as usize)?;
        if slot.as_ref().is_some_and(|(held, _)| *held == id) {
            slot.take().map(|(_, el)| el)
        } else {
            None
        }
    }

    /// Returns the element attached to `id`.
    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&HtmlElement> {
        match self.elements.get(id.index() as usize)? {
            Some((held, el)) if *held == id => Some(el),
            _ => None,
        }
    }

    /// Detaches every element.
    pub fn clear(&mut self) {
        self.elements.clear();
    }
}

impl RatioHost for DomRatioHost {
    fn set_padding_bottom(&mut self, id: ElementId, value: &str) {
        if let Some(el) = self.element(id) {
            let _ = el.style().set_property(PADDING_BOTTOM, value);
        }
    }

    fn has_inline_padding(&self, id: ElementId) -> bool {
        self.element(id).is_some_and(|el| {
            el.style()
                .get_property_value(PADDING_BOTTOM)
                .is_ok_and(|v| !v.is_empty())
        })
    }

    fn is_attached(&self, id: ElementId) -> bool {
        self.element(id).is_some_and(|el| el.is_connected())
    }

    fn release(&mut self, id: ElementId) {
        self.detach(id);
    }
}
