//! ItemNormalizer: maps upstream items into storage rows.

use tracing::{debug, error};

use crate::contract::{StorageRow, UpstreamItem};
use crate::error::NormalizeError;

/// Map one item. `index` is its position in the fetched list and only used for errors.
pub fn normalize(index: usize, item: &UpstreamItem) -> Result<StorageRow, NormalizeError> {
    let item_id = match item.id.as_deref() {
        Some(id) if !id.trim().is_empty() => id.to_string(),
        _ => return Err(NormalizeError::MissingIdentifier { index }),
    };

    let slots: &[String] = item.loadout_slots.as_deref().unwrap_or(&[]);
    let loadout_slots =
        serde_json::to_string(slots).map_err(|source| NormalizeError::Encode {
            item_id: item_id.clone(),
            source,
        })?;

    Ok(StorageRow {
        item_id,
        name: item.name.clone().unwrap_or_default(),
        description: item.description.clone().unwrap_or_default(),
        item_type: item.item_type.clone().unwrap_or_default(),
        loadout_slots,
        icon: item.icon.clone().unwrap_or_default(),
        rarity: item.rarity.clone().unwrap_or_default(),
        value: item.value.clone(),
    })
}

/// Map every item, failing on the first one without an identifier.
pub fn normalize_all(items: &[UpstreamItem]) -> Result<Vec<StorageRow>, NormalizeError> {
    let rows = items
        .iter()
        .enumerate()
        .map(|(index, item)| normalize(index, item))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            error!(error = %e, "[NORMALIZE][ERROR] Item rejected");
            e
        })?;
    debug!(rows = rows.len(), "[NORMALIZE] Items mapped to rows");
    Ok(rows)
}
