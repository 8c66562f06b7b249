//! Raw material resolution for receipt lines
//!
//! A receipt line can name its raw material in several ways. The keys are
//! tried in a fixed order: explicit id, name, SKU, and finally the purchase
//! order detail behind the invoice item.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One way of identifying a raw material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum LookupKey {
    Id(Uuid),
    Name(String),
    Sku(String),
    /// Invoice item → purchase order detail → raw material
    InvoiceItem(Uuid),
}

/// Raw material row as seen by the resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMaterialCandidate {
    pub id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    /// Invoice item whose order detail points at this raw material
    pub via_invoice_item: Option<Uuid>,
}

/// Optional identifying hints carried by a receipt line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMaterialHints<'a> {
    pub raw_material_id: Option<Uuid>,
    pub name: Option<&'a str>,
    pub sku: Option<&'a str>,
}

/// Build the ordered lookup plan for a receipt line. Blank names and SKUs are
/// skipped; the invoice item join is always the last resort.
pub fn lookup_plan(hints: &RawMaterialHints<'_>, invoice_item_id: Uuid) -> Vec<LookupKey> {
    let mut plan = Vec::with_capacity(4);

    if let Some(id) = hints.raw_material_id {
        plan.push(LookupKey::Id(id));
    }
    if let Some(name) = hints.name.map(str::trim).filter(|n| !n.is_empty()) {
        plan.push(LookupKey::Name(name.to_string()));
    }
    if let Some(sku) = hints.sku.map(str::trim).filter(|s| !s.is_empty()) {
        plan.push(LookupKey::Sku(sku.to_string()));
    }
    plan.push(LookupKey::InvoiceItem(invoice_item_id));

    plan
}

impl LookupKey {
    /// Whether `candidate` satisfies this key
    pub fn matches(&self, candidate: &RawMaterialCandidate) -> bool {
        match self {
            LookupKey::Id(id) => candidate.id == *id,
            LookupKey::Name(name) => {
                candidate.name.trim().to_lowercase() == name.trim().to_lowercase()
            }
            LookupKey::Sku(sku) => candidate.sku.as_deref() == Some(sku.as_str()),
            LookupKey::InvoiceItem(item_id) => candidate.via_invoice_item == Some(*item_id),
        }
    }
}

/// Pick the raw material for the first key in `plan` that matches any
/// candidate. Within a key, the first matching candidate wins.
pub fn resolve_raw_material(plan: &[LookupKey], candidates: &[RawMaterialCandidate]) -> Option<Uuid> {
    plan.iter().find_map(|key| {
        candidates
            .iter()
            .find(|candidate| key.matches(candidate))
            .map(|candidate| candidate.id)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, sku: Option<&str>, via: Option<Uuid>) -> RawMaterialCandidate {
        RawMaterialCandidate {
            id: Uuid::new_v4(),
            name: name.to_string(),
            sku: sku.map(str::to_string),
            via_invoice_item: via,
        }
    }

    #[test]
    fn test_plan_order() {
        let id = Uuid::new_v4();
        let item = Uuid::new_v4();
        let hints = RawMaterialHints {
            raw_material_id: Some(id),
            name: Some(" Flour "),
            sku: Some("FL-01"),
        };
        assert_eq!(
            lookup_plan(&hints, item),
            vec![
                LookupKey::Id(id),
                LookupKey::Name("Flour".to_string()),
                LookupKey::Sku("FL-01".to_string()),
                LookupKey::InvoiceItem(item),
            ]
        );
    }

    #[test]
    fn test_plan_skips_blank_hints() {
        let item = Uuid::new_v4();
        let hints = RawMaterialHints {
            raw_material_id: None,
            name: Some("   "),
            sku: None,
        };
        assert_eq!(lookup_plan(&hints, item), vec![LookupKey::InvoiceItem(item)]);
    }

    #[test]
    fn test_id_beats_later_keys() {
        let item = Uuid::new_v4();
        let by_join = candidate("Sugar", None, Some(item));
        let by_id = candidate("Salt", None, None);
        let plan = lookup_plan(
            &RawMaterialHints {
                raw_material_id: Some(by_id.id),
                ..Default::default()
            },
            item,
        );
        let resolved = resolve_raw_material(&plan, &[by_join, by_id.clone()]);
        assert_eq!(resolved, Some(by_id.id));
    }

    #[test]
    fn test_name_match_is_case_insensitive() {
        let item = Uuid::new_v4();
        let flour = candidate("Wheat Flour", Some("WF"), None);
        let plan = lookup_plan(
            &RawMaterialHints {
                name: Some("wheat flour"),
                ..Default::default()
            },
            item,
        );
        assert_eq!(resolve_raw_material(&plan, &[flour.clone()]), Some(flour.id));
    }

    #[test]
    fn test_falls_back_to_invoice_join() {
        let item = Uuid::new_v4();
        let joined = candidate("Milk", Some("MK"), Some(item));
        let plan = lookup_plan(
            &RawMaterialHints {
                name: Some("Cream"),
                sku: Some("CR"),
                ..Default::default()
            },
            item,
        );
        assert_eq!(resolve_raw_material(&plan, &[joined.clone()]), Some(joined.id));
    }

    #[test]
    fn test_unresolved_returns_none() {
        let plan = lookup_plan(&RawMaterialHints::default(), Uuid::new_v4());
        assert_eq!(resolve_raw_material(&plan, &[candidate("Oil", None, None)]), None);
    }
}
