//! Working-set controller.
//!
//! [`LabelSession`] owns the generated labels together with the template,
//! the short-id length and the selection/editing state, and routes every
//! change through the pure functions in [`crate::batch`].

use crate::batch::{self, Selection};
use crate::model::{Label, LabelTemplate};
use crate::serialization::import_labels_json;
use labelkit_core::ValidationError;
use tracing::{debug, info};

/// Selection and editing mode
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditingState {
    pub is_editing: bool,
    /// Selected label ids, in selection order
    pub selected: Vec<String>,
    /// Editing applies to every label
    pub editing_all: bool,
}

impl EditingState {
    fn selection(&self) -> Selection {
        if self.editing_all {
            Selection::All
        } else {
            Selection::ids(self.selected.iter().cloned())
        }
    }
}

#[derive(Debug, Clone)]
pub struct LabelSession {
    labels: Vec<Label>,
    template: LabelTemplate,
    uuid_length: usize,
    editing: EditingState,
}

impl LabelSession {
    pub fn new(template: LabelTemplate, uuid_length: usize) -> Result<Self, ValidationError> {
        batch::validate_uuid_length(uuid_length)?;
        Ok(Self {
            labels: Vec::new(),
            template,
            uuid_length,
            editing: EditingState::default(),
        })
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn template(&self) -> &LabelTemplate {
        &self.template
    }

    pub fn set_template(&mut self, template: LabelTemplate) {
        self.template = template;
    }

    pub fn uuid_length(&self) -> usize {
        self.uuid_length
    }

    pub fn editing_state(&self) -> &EditingState {
        &self.editing
    }

    pub fn label(&self, id: &str) -> Option<&Label> {
        self.labels.iter().find(|label| label.id == id)
    }

    /// Replace the working set with `quantity` fresh labels.
    pub fn generate(&mut self, quantity: usize) -> Result<&[Label], ValidationError> {
        self.labels = batch::generate_labels(quantity, &self.template, self.uuid_length)?;
        self.editing = EditingState::default();
        Ok(&self.labels)
    }

    /// Change the short-id length and recompute every label's short id.
    pub fn set_uuid_length(&mut self, length: usize) -> Result<(), ValidationError> {
        self.labels = batch::reshorten(&self.labels, length)?;
        self.uuid_length = length;
        debug!("Short id length set to {}", length);
        Ok(())
    }

    pub fn toggle_selection(&mut self, id: &str) {
        if let Some(index) = self.editing.selected.iter().position(|s| s == id) {
            self.editing.selected.remove(index);
        } else {
            self.editing.selected.push(id.to_string());
        }
    }

    pub fn select_all(&mut self) {
        self.editing.selected = self.labels.iter().map(|label| label.id.clone()).collect();
    }

    pub fn clear_selection(&mut self) {
        self.editing.selected.clear();
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.editing.selected.iter().any(|s| s == id)
    }

    /// Enter editing mode.
    ///
    /// With an id, edits that label alone. Without one, edits the current
    /// selection, or every label when nothing is selected.
    pub fn start_editing(&mut self, id: Option<&str>) {
        match id {
            Some(id) => {
                self.editing = EditingState {
                    is_editing: true,
                    selected: vec![id.to_string()],
                    editing_all: false,
                };
            }
            None if !self.editing.selected.is_empty() => {
                self.editing.is_editing = true;
                self.editing.editing_all = false;
            }
            None => {
                self.editing = EditingState {
                    is_editing: true,
                    selected: Vec::new(),
                    editing_all: true,
                };
            }
        }
    }

    pub fn stop_editing(&mut self) {
        self.editing = EditingState::default();
    }

    /// Label the editor should open with
    pub fn editor_target(&self) -> Option<&Label> {
        if !self.editing.is_editing {
            return None;
        }
        if self.editing.editing_all {
            self.labels.first()
        } else {
            self.editing.selected.first().and_then(|id| self.label(id))
        }
    }

    /// True when a saved edit will be applied to more than one label
    pub fn is_bulk_edit(&self) -> bool {
        self.editing.editing_all || self.editing.selected.len() > 1
    }

    /// Commit an edited label.
    ///
    /// In bulk mode the edit is applied to every target label as a template,
    /// keeping each label's own positions, product name and identifiers.
    pub fn apply_edit(&mut self, edited: &Label) -> Result<(), ValidationError> {
        if self.is_bulk_edit() {
            let template = LabelTemplate {
                size: edited.size.clone(),
                elements: edited.elements.clone(),
                company_name: edited.company_name.clone(),
                prefix: edited.prefix.clone(),
                text: edited.text.clone(),
            };
            self.labels = batch::update_labels(
                &self.labels,
                &self.editing.selection(),
                &template,
                self.uuid_length,
            )?;
        } else {
            self.labels = batch::update_label(&self.labels, edited)?;
        }
        Ok(())
    }

    /// Append a copy of one label.
    pub fn duplicate(&mut self, id: &str) -> Result<&Label, ValidationError> {
        let source = self
            .label(id)
            .ok_or_else(|| ValidationError::LabelNotFound { id: id.to_string() })?;
        let copy = batch::duplicate_label(source);
        self.labels.push(copy);
        Ok(&self.labels[self.labels.len() - 1])
    }

    /// Append copies of the selected labels and clear the selection.
    pub fn duplicate_selected(&mut self) -> usize {
        let copies = batch::duplicate_labels(&self.labels, &self.editing.selection());
        let count = copies.len();
        self.labels.extend(copies);
        self.editing.selected.clear();
        count
    }

    /// Remove the selected labels and clear the selection.
    pub fn delete_selected(&mut self) -> usize {
        let before = self.labels.len();
        self.labels = batch::delete_labels(&self.labels, &self.editing.selection());
        self.editing.selected.clear();
        before - self.labels.len()
    }

    /// Labels whose product name or short id contains `term`, ignoring case.
    /// An empty term matches everything.
    pub fn search(&self, term: &str) -> Vec<&Label> {
        let needle = term.to_lowercase();
        self.labels
            .iter()
            .filter(|label| {
                needle.is_empty()
                    || label.product_name.to_lowercase().contains(&needle)
                    || label.short_uuid.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Selected labels in working-set order, or every label when nothing is
    /// selected.
    pub fn export_targets(&self) -> Vec<Label> {
        if self.editing.selected.is_empty() {
            return self.labels.clone();
        }
        self.labels
            .iter()
            .filter(|label| self.is_selected(&label.id))
            .cloned()
            .collect()
    }

    /// Replace the working set with validated labels from JSON.
    pub fn import(&mut self, json: &str) -> Result<usize, ValidationError> {
        let labels = import_labels_json(json)?;
        self.labels = labels;
        self.editing = EditingState::default();
        info!("Imported {} labels", self.labels.len());
        Ok(self.labels.len())
    }

    pub fn replace_labels(&mut self, labels: Vec<Label>) {
        self.labels = labels;
        self.editing = EditingState::default();
    }
}
