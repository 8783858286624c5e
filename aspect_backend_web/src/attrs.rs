// Copyright 2026 the Aspect Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Container attributes.
//!
//! A ratio container describes itself with `data-b-*` attributes:
//!
//! ```html
//! <div data-b-ratios='{"320": 56.25, "768": 42.5}' data-b-ratio="56.25%"
//!      data-b-group="gallery">
//!   <picture>...</picture>
//! </div>
//! ```

use alloc::collections::BTreeMap;
use alloc::string::String;

use aspect_core::dataset::{Ratio, RatioDataset};
use aspect_core::element::GroupId;
use aspect_core::ratio::MountSpec;
use aspect_core::trace::Tracer;
use web_sys::Element;

/// JSON breakpoint dataset of padding ratios.
pub const RATIOS_ATTR: &str = "data-b-ratios";
/// Static fallback ratio, used when the dataset is empty.
pub const RATIO_ATTR: &str = "data-b-ratio";
/// Uniform group name.
pub const GROUP_ATTR: &str = "data-b-group";

/// Raw attribute values of one container.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MountAttrs {
    /// Value of [`RATIOS_ATTR`].
    pub ratios: Option<String>,
    /// Value of [`RATIO_ATTR`].
    pub ratio: Option<String>,
    /// Value of [`GROUP_ATTR`].
    pub group: Option<String>,
    /// Whether the container is or wraps a `<picture>`.
    pub picture: bool,
}

impl MountAttrs {
    /// Reads the attributes of `el`.
    #[must_use]
    pub fn read(el: &Element) -> Self {
        let picture = el.tag_name().eq_ignore_ascii_case("picture")
            || el.query_selector("picture").ok().flatten().is_some();
        Self {
            ratios: el.get_attribute(RATIOS_ATTR),
            ratio: el.get_attribute(RATIO_ATTR),
            group: el.get_attribute(GROUP_ATTR),
            picture,
        }
    }

    /// Builds the mount description.
    ///
    /// A malformed dataset becomes empty (reported to `tracer`), an
    /// unparsable fallback is ignored, and a blank group name means no group.
    #[must_use]
    pub fn to_spec(&self, groups: &mut GroupNames, tracer: &mut Tracer<'_>) -> MountSpec {
        let dataset = match self.ratios.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => RatioDataset::parse_lenient(text, tracer),
            _ => RatioDataset::new(),
        };
        MountSpec {
            dataset,
            group: self
                .group
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| groups.intern(name)),
            picture: self.picture,
            fallback: self.ratio.as_deref().and_then(Ratio::parse),
        }
    }
}

/// Interns group names into [`GroupId`]s.
#[derive(Clone, Debug, Default)]
pub struct GroupNames {
    ids: BTreeMap<String, GroupId>,
}

impl GroupNames {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `name`, allocating one on first use.
    pub fn intern(&mut self, name: &str) -> GroupId {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        let id = GroupId(u64::try_from(self.ids.len()).unwrap_or(u64::MAX));
        self.ids.insert(name.into(), id);
        id
    }

    /// Returns the id previously allocated for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<GroupId> {
        self.ids.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(ratios: Option<&str>, ratio: Option<&str>, group: Option<&str>) -> MountAttrs {
        MountAttrs {
            ratios: ratios.map(Into::into),
            ratio: ratio.map(Into::into),
            group: group.map(Into::into),
            picture: false,
        }
    }

    #[test]
    fn full_attributes_build_a_spec() {
        let mut groups = GroupNames::new();
        let spec = attrs(
            Some(r#"{"320": 56.25, "768": "42.5%"}"#),
            Some("75%"),
            Some(" gallery "),
        )
        .to_spec(&mut groups, &mut Tracer::none());

        assert_eq!(spec.dataset.len(), 2);
        assert_eq!(spec.dataset.get(768).copied(), Ratio::new(42.5));
        assert_eq!(spec.fallback, Ratio::new(75.0));
        assert_eq!(spec.group, groups.get("gallery"));
        assert!(spec.group.is_some());
    }

    #[test]
    fn malformed_or_missing_attributes_degrade() {
        let mut groups = GroupNames::new();
        let spec = attrs(Some("{oops"), Some("wide"), Some("   "))
            .to_spec(&mut groups, &mut Tracer::none());
        assert!(spec.dataset.is_empty());
        assert_eq!(spec.fallback, None);
        assert_eq!(spec.group, None);

        let spec = MountAttrs::default().to_spec(&mut groups, &mut Tracer::none());
        assert_eq!(spec, MountSpec::default());
    }

    #[test]
    fn group_names_are_stable() {
        let mut groups = GroupNames::new();
        let a = groups.intern("a");
        let b = groups.intern("b");
        assert_eq!((a, b), (GroupId(0), GroupId(1)));
        assert_eq!(groups.intern("a"), a);
    }
}
