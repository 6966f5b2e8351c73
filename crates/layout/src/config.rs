use lineage_data::PersonId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors raised when validating caller supplied configuration
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f32 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("{field} must be strictly positive, got {value}")]
    NonPositiveSize { field: &'static str, value: f32 },

    #[error("unknown detail level {0}, expected 1, 2 or 3")]
    UnknownDetailLevel(u8),
}

/// Spacing and sizing constants, in layout units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutConstants {
    /// Minimum edge to edge distance between two non-spouse neighbours of a layer
    pub sibling_gap: f32,
    /// Vertical distance between the bottom of a generation band and the top of the next
    pub generation_gap: f32,
    /// Edge to edge distance between spouses
    pub spouse_gap: f32,
    /// Extra distance between independent family trees
    pub branch_gap: f32,
    pub node_width: f32,
    pub node_height: f32,
    /// Margin added around the content bounds
    pub padding: f32,
}

impl Default for LayoutConstants {
    fn default() -> Self {
        Self {
            sibling_gap: 200.0,
            generation_gap: 150.0,
            spouse_gap: 50.0,
            branch_gap: 100.0,
            node_width: 160.0,
            node_height: 80.0,
            padding: 100.0,
        }
    }
}

impl LayoutConstants {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let gaps = [
            ("sibling_gap", self.sibling_gap),
            ("generation_gap", self.generation_gap),
            ("spouse_gap", self.spouse_gap),
            ("branch_gap", self.branch_gap),
            ("padding", self.padding),
        ];
        let sizes = [
            ("node_width", self.node_width),
            ("node_height", self.node_height),
        ];

        for (field, value) in gaps.into_iter().chain(sizes) {
            if !value.is_finite() {
                return Err(ConfigError::NonFinite { field, value });
            }
        }
        for (field, value) in gaps {
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }
        for (field, value) in sizes {
            if value <= 0.0 {
                return Err(ConfigError::NonPositiveSize { field, value });
            }
        }
        Ok(())
    }

    /// Every size and gap multiplied by `factor`
    pub fn scaled(&self, factor: f32) -> Self {
        Self {
            sibling_gap: self.sibling_gap * factor,
            generation_gap: self.generation_gap * factor,
            spouse_gap: self.spouse_gap * factor,
            branch_gap: self.branch_gap * factor,
            node_width: self.node_width * factor,
            node_height: self.node_height * factor,
            padding: self.padding * factor,
        }
    }

    /// Left edge to left edge distance of two spouses
    pub fn spouse_pitch(&self) -> f32 {
        self.node_width + self.spouse_gap
    }

    /// Minimum left edge to left edge distance of two non-spouse neighbours
    pub fn sibling_pitch(&self) -> f32 {
        self.node_width + self.sibling_gap
    }

    /// Distance between the tops of two consecutive generation bands
    pub fn layer_pitch(&self) -> f32 {
        self.node_height + self.generation_gap
    }
}

/// Zoom dependent level of detail
///
/// Each level scales node sizes and every gap by the same factor, so
/// switching levels only rescales the layout, it never changes its topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum DetailLevel {
    /// Dots only
    Overview = 1,
    /// Small boxes with a name
    Summary = 2,
    #[default]
    Full = 3,
}

impl DetailLevel {
    pub const OVERVIEW_MAX_ZOOM: f32 = 0.2;
    pub const SUMMARY_MAX_ZOOM: f32 = 0.5;

    pub fn for_zoom(zoom: f32) -> Self {
        if zoom < Self::OVERVIEW_MAX_ZOOM {
            DetailLevel::Overview
        } else if zoom < Self::SUMMARY_MAX_ZOOM {
            DetailLevel::Summary
        } else {
            DetailLevel::Full
        }
    }

    /// Factor applied to node sizes and gaps
    pub fn scale(self) -> f32 {
        match self {
            DetailLevel::Overview => 0.125,
            DetailLevel::Summary => 0.5,
            DetailLevel::Full => 1.0,
        }
    }
}

impl TryFrom<u8> for DetailLevel {
    type Error = ConfigError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            1 => Ok(DetailLevel::Overview),
            2 => Ok(DetailLevel::Summary),
            3 => Ok(DetailLevel::Full),
            other => Err(ConfigError::UnknownDetailLevel(other)),
        }
    }
}

/// Everything besides the tree and the focus that shapes a layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutOptions {
    pub detail: DetailLevel,
    /// Persons whose children are shown
    pub expanded: BTreeSet<PersonId>,
    /// Constants at full detail, scaled by `detail`
    pub constants: LayoutConstants,
    /// Emit one family junction per cluster instead of one connector per child
    pub family_junctions: bool,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            detail: DetailLevel::default(),
            expanded: BTreeSet::new(),
            constants: LayoutConstants::default(),
            family_junctions: true,
        }
    }
}

impl LayoutOptions {
    pub fn with_detail(mut self, detail: DetailLevel) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_expanded<I>(mut self, ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<PersonId>,
    {
        self.expanded = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn expand(mut self, id: impl Into<PersonId>) -> Self {
        self.expanded.insert(id.into());
        self
    }

    pub fn with_family_junctions(mut self, family_junctions: bool) -> Self {
        self.family_junctions = family_junctions;
        self
    }

    /// # Errors
    /// Returns an error if a constant is negative, non-finite, or a node size is not positive
    pub fn with_constants(mut self, constants: LayoutConstants) -> Result<Self, ConfigError> {
        constants.validate()?;
        self.constants = constants;
        Ok(self)
    }

    /// Constants actually used by the layout at the current detail level
    pub fn effective_constants(&self) -> LayoutConstants {
        self.constants.scaled(self.detail.scale())
    }
}
