use crate::{Viewport, ViewError};
use lineage_data::{PersonId, TreeSnapshot};
use lineage_layout::{
    compute_layout, focus_lineage, DetailLevel, LayoutOptions, Point, TreeLayout, TreeNode, Vec2,
};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Everything a chart needs between two frames
///
/// The view owns the tree, the focus, the fold state and the viewport, and
/// keeps a layout computed from them. Every change that affects the layout
/// recomputes it right away.
#[derive(Debug, Clone, Default)]
pub struct TreeView {
    tree: Option<TreeSnapshot>,
    focus: Option<PersonId>,
    selected: Option<PersonId>,
    options: LayoutOptions,
    layout: Option<TreeLayout>,
    viewport: Viewport,
}

impl TreeView {
    pub fn new(options: LayoutOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn tree(&self) -> Option<&TreeSnapshot> {
        self.tree.as_ref()
    }

    pub fn focus(&self) -> Option<&PersonId> {
        self.focus.as_ref()
    }

    pub fn selected(&self) -> Option<&PersonId> {
        self.selected.as_ref()
    }

    pub fn layout(&self) -> Option<&TreeLayout> {
        self.layout.as_ref()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn detail(&self) -> DetailLevel {
        self.options.detail
    }

    /// Persons whose children are unfolded
    pub fn expanded(&self) -> &BTreeSet<PersonId> {
        &self.options.expanded
    }

    pub fn selected_node(&self) -> Option<&TreeNode> {
        let id = self.selected.as_ref()?;
        self.layout.as_ref()?.node(id)
    }

    /// Show a new tree
    ///
    /// The focus is kept when the new tree still has it, otherwise the first
    /// person becomes the focus. The fold state restarts from the lineage of
    /// the focus and the chart is fitted to the screen.
    pub fn load(&mut self, tree: TreeSnapshot) {
        let focus = self
            .focus
            .take()
            .filter(|id| tree.contains(id))
            .or_else(|| tree.persons.first().map(|p| p.id.clone()));
        info!("Loaded a tree of {} persons", tree.persons.len());

        self.selected = self.selected.take().filter(|id| tree.contains(id));
        self.options.expanded = match &focus {
            Some(focus) => focus_lineage(&tree, focus),
            None => BTreeSet::new(),
        };
        self.focus = focus;
        self.tree = Some(tree);
        self.relayout();
        self.fit_to_screen();
    }

    /// Centre the chart on another person, folding everything off their lineage
    pub fn set_focus(&mut self, id: PersonId) -> Result<(), ViewError> {
        let tree = self.tree.as_ref().ok_or(ViewError::NoTree)?;
        if !tree.contains(&id) {
            return Err(ViewError::UnknownPerson(id));
        }
        debug!("Focus on {}", id);
        self.options.expanded = focus_lineage(tree, &id);
        self.focus = Some(id);
        self.relayout();
        Ok(())
    }

    pub fn select(&mut self, id: Option<PersonId>) -> Result<(), ViewError> {
        if let Some(id) = &id {
            let tree = self.tree.as_ref().ok_or(ViewError::NoTree)?;
            if !tree.contains(id) {
                return Err(ViewError::UnknownPerson(id.clone()));
            }
        }
        self.selected = id;
        Ok(())
    }

    /// Fold or unfold the children of a person, returns whether they are now
    /// unfolded
    pub fn toggle_expanded(&mut self, id: &PersonId) -> Result<bool, ViewError> {
        let tree = self.tree.as_ref().ok_or(ViewError::NoTree)?;
        if !tree.contains(id) {
            return Err(ViewError::UnknownPerson(id.clone()));
        }

        let expanded = if self.options.expanded.remove(id) {
            false
        } else {
            self.options.expanded.insert(id.clone());
            true
        };
        debug!("{} {}", if expanded { "Unfolded" } else { "Folded" }, id);
        self.relayout();
        Ok(expanded)
    }

    pub fn set_detail(&mut self, detail: DetailLevel) {
        if self.options.detail != detail {
            debug!("Detail level {:?}", detail);
            self.options.detail = detail;
            self.relayout();
        }
    }

    pub fn set_family_junctions(&mut self, family_junctions: bool) {
        if self.options.family_junctions != family_junctions {
            self.options.family_junctions = family_junctions;
            self.relayout();
        }
    }

    pub fn resize(&mut self, size: Vec2) {
        let bounds = self.layout.as_ref().map(|l| l.bounds);
        self.viewport.resize(size, bounds.as_ref());
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.viewport.pan(delta);
    }

    pub fn zoom(&mut self, zoom: f32, pivot: Option<Point>) {
        self.viewport.zoom_to(zoom, pivot);
    }

    pub fn fit_to_screen(&mut self) {
        let bounds = self.layout.as_ref().map(|l| l.bounds);
        self.viewport.fit_to_screen(bounds.as_ref());
    }

    fn relayout(&mut self) {
        self.layout = match (&self.tree, &self.focus) {
            (Some(tree), Some(focus)) => Some(compute_layout(tree, focus, &self.options)),
            _ => None,
        };
        let bounds = self.layout.as_ref().map(|l| l.bounds);
        self.viewport.fit_zoom = self.viewport.fitting_zoom(bounds.as_ref());
    }
}
