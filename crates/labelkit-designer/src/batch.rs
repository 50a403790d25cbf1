//! # Batch Operations Module
//!
//! Pure functions that create and edit the working set of labels:
//! - Generation of N labels from a template with fresh identifiers
//! - Single and bulk edits (bulk edits keep per-label positions and product names)
//! - Duplication with refreshed identifiers
//! - Deletion
//!
//! Each function returns new values; inputs are never modified in place.

use crate::model::{Label, LabelTemplate};
use labelkit_core::ValidationError;
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

/// Shortest accepted short-id length
pub const MIN_UUID_LENGTH: usize = 4;
/// Longest accepted short-id length (a full hyphenated UUID)
pub const MAX_UUID_LENGTH: usize = 36;
/// Short-id length used when nothing else is configured
pub const DEFAULT_UUID_LENGTH: usize = 8;

/// Which labels a bulk operation applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Ids(HashSet<String>),
}

impl Selection {
    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selection::Ids(ids.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, id: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Ids(ids) => ids.contains(id),
        }
    }
}

pub fn validate_uuid_length(length: usize) -> Result<(), ValidationError> {
    if (MIN_UUID_LENGTH..=MAX_UUID_LENGTH).contains(&length) {
        Ok(())
    } else {
        Err(ValidationError::InvalidUuidLength {
            length,
            min: MIN_UUID_LENGTH,
            max: MAX_UUID_LENGTH,
        })
    }
}

/// Leading `length` characters of `uuid`
pub fn short_uuid(uuid: &str, length: usize) -> String {
    uuid.chars().take(length).collect()
}

fn fresh_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create `quantity` labels from `template`.
///
/// Every label receives its own id, UUID and copies of the template's size
/// and elements. Product names start empty.
pub fn generate_labels(
    quantity: usize,
    template: &LabelTemplate,
    uuid_length: usize,
) -> Result<Vec<Label>, ValidationError> {
    if quantity < 1 {
        return Err(ValidationError::InvalidQuantity {
            quantity: quantity as i64,
        });
    }
    validate_uuid_length(uuid_length)?;

    let labels: Vec<Label> = (0..quantity)
        .map(|_| {
            let uuid = fresh_id();
            Label {
                id: fresh_id(),
                size: template.size.clone(),
                elements: template.elements.clone(),
                company_name: template.company_name.clone(),
                short_uuid: short_uuid(&uuid, uuid_length),
                uuid,
                prefix: template.prefix.clone(),
                product_name: String::new(),
                text: template.text.clone(),
            }
        })
        .collect();

    info!(
        "Generated {} labels (short id length {})",
        labels.len(),
        uuid_length
    );
    Ok(labels)
}

/// Replace the label whose id matches `updated`.
pub fn update_label(labels: &[Label], updated: &Label) -> Result<Vec<Label>, ValidationError> {
    if !labels.iter().any(|label| label.id == updated.id) {
        return Err(ValidationError::LabelNotFound {
            id: updated.id.clone(),
        });
    }
    Ok(labels
        .iter()
        .map(|label| {
            if label.id == updated.id {
                updated.clone()
            } else {
                label.clone()
            }
        })
        .collect())
}

/// Apply `template` to every selected label.
///
/// Size, elements, company name, text and prefix come from the template.
/// Each label keeps its own element positions, product name and UUID; its
/// short id is recomputed at `uuid_length`.
pub fn update_labels(
    labels: &[Label],
    selection: &Selection,
    template: &LabelTemplate,
    uuid_length: usize,
) -> Result<Vec<Label>, ValidationError> {
    validate_uuid_length(uuid_length)?;

    let mut touched = 0usize;
    let result = labels
        .iter()
        .map(|label| {
            if !selection.contains(&label.id) {
                return label.clone();
            }
            touched += 1;
            let mut elements = template.elements.clone();
            elements.adopt_positions(&label.elements);
            Label {
                id: label.id.clone(),
                size: template.size.clone(),
                elements,
                company_name: template.company_name.clone(),
                uuid: label.uuid.clone(),
                short_uuid: short_uuid(&label.uuid, uuid_length),
                prefix: template.prefix.clone(),
                product_name: label.product_name.clone(),
                text: template.text.clone(),
            }
        })
        .collect();

    info!("Bulk update applied to {} labels", touched);
    Ok(result)
}

/// Copy of `label` with a new id and UUID.
///
/// The short id keeps the source's length.
pub fn duplicate_label(label: &Label) -> Label {
    let uuid = fresh_id();
    let mut copy = label.clone();
    copy.id = fresh_id();
    copy.short_uuid = short_uuid(&uuid, label.short_uuid_len());
    copy.uuid = uuid;
    debug!("Duplicated label {} as {}", label.id, copy.id);
    copy
}

/// Duplicates of every selected label, in working-set order.
pub fn duplicate_labels(labels: &[Label], selection: &Selection) -> Vec<Label> {
    labels
        .iter()
        .filter(|label| selection.contains(&label.id))
        .map(duplicate_label)
        .collect()
}

/// Labels that are not selected.
pub fn delete_labels(labels: &[Label], selection: &Selection) -> Vec<Label> {
    let kept: Vec<Label> = labels
        .iter()
        .filter(|label| !selection.contains(&label.id))
        .cloned()
        .collect();
    info!("Deleted {} labels", labels.len() - kept.len());
    kept
}

/// Recompute every short id from its own UUID.
pub fn reshorten(labels: &[Label], uuid_length: usize) -> Result<Vec<Label>, ValidationError> {
    validate_uuid_length(uuid_length)?;
    Ok(labels
        .iter()
        .map(|label| Label {
            short_uuid: short_uuid(&label.uuid, uuid_length),
            ..label.clone()
        })
        .collect())
}
