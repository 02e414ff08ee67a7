// ── Built-in derivation rules ──
//
// The ledgers share a handful of patterns: a quantity that is the sum of
// weighbridge / bag entries, a sum that only applies under one purchase
// type, and fields that exist only for one selector value.

use std::time::Duration;

use super::engine::{Derivation, DerivationRule, FieldFlags};
use super::values::{FieldValue, FormValues, Numeric};
use crate::model::Ledger;

/// Quiet period before an entry sum is recomputed while typing.
pub const SUM_DEBOUNCE: Duration = Duration::from_millis(250);

fn sum_of(values: &FormValues, list_field: &str, entry_field: &str) -> Numeric {
    let sum: f64 = values
        .entries(list_field)
        .iter()
        .map(|entry| entry.number(entry_field))
        .sum();
    Numeric::total(sum)
}

/// `target = Σ entries[*].entry_field`, non-numeric entries counting as 0
/// and a zero total left blank.
pub fn sum_entries(name: &str, list_field: &str, entry_field: &str, target: &str) -> DerivationRule {
    let (list, entry, out) = (
        list_field.to_owned(),
        entry_field.to_owned(),
        target.to_owned(),
    );
    DerivationRule::new(name, move |input| {
        Derivation::none().set(
            out.clone(),
            FieldValue::Number(sum_of(input.current, &list, &entry)),
        )
    })
    .depends_on([list_field])
    .writes([target])
}

/// Auto-sum that only applies while `selector == when`.
///
/// While the selector holds `when`, `target` is read-only and equals the
/// entry sum. When the selector moves away, `target` is cleared once and
/// becomes editable; later keystrokes in the entries leave it alone.
pub fn conditional_sum(
    name: &str,
    selector: &str,
    when: &str,
    list_field: &str,
    entry_field: &str,
    target: &str,
) -> DerivationRule {
    let (sel, when_value, list, entry, out) = (
        selector.to_owned(),
        when.to_owned(),
        list_field.to_owned(),
        entry_field.to_owned(),
        target.to_owned(),
    );
    DerivationRule::new(name, move |input| {
        let active = input.current.display(&sel) == when_value;
        let flags = FieldFlags {
            read_only: active,
            ..FieldFlags::default()
        };
        let derivation = Derivation::none().flag(out.clone(), flags);

        if active {
            return derivation.set(
                out.clone(),
                FieldValue::Number(sum_of(input.current, &list, &entry)),
            );
        }
        let was_active = input
            .previous
            .is_some_and(|prev| prev.display(&sel) == when_value);
        if was_active {
            derivation.set(out.clone(), FieldValue::Unset)
        } else {
            derivation
        }
    })
    .depends_on([selector, list_field])
    .writes([target])
}

/// A field that is shown and required only while `selector == when`, and
/// cleared once when the selector leaves that value.
pub fn branch_field(name: &str, selector: &str, when: &str, field: &str) -> DerivationRule {
    let (sel, when_value, out) = (selector.to_owned(), when.to_owned(), field.to_owned());
    DerivationRule::new(name, move |input| {
        let active = input.current.display(&sel) == when_value;
        let derivation = Derivation::none().flag(
            out.clone(),
            FieldFlags {
                hidden: !active,
                required: active,
                read_only: false,
            },
        );
        let left_branch = !active
            && input
                .previous
                .is_some_and(|prev| prev.display(&sel) == when_value);
        if left_branch {
            derivation.set(out.clone(), FieldValue::Unset)
        } else {
            derivation
        }
    })
    .depends_on([selector])
    .writes([field])
}

/// The rules a ledger's form registers on mount.
///
/// Purchases weigh paddy either on the weighbridge (quantity summed from
/// the weighing entries) or by hand, and may go through a broker. Stock
/// movement registers total the bags across their truck entries.
pub fn for_ledger(ledger: Ledger) -> Vec<DerivationRule> {
    match ledger {
        Ledger::PaddyPurchases | Ledger::RicePurchases | Ledger::FrkPurchases => vec![
            conditional_sum(
                "weighbridge-quantity",
                "purchaseType",
                "weighbridge",
                "entries",
                "quantity",
                "totalQuantity",
            )
            .debounce(SUM_DEBOUNCE),
            branch_field("broker", "purchaseVia", "broker", "brokerName"),
        ],
        Ledger::PaddyInward | Ledger::RiceInward | Ledger::RiceOutward | Ledger::GunnyOutward => {
            vec![sum_entries("bag-total", "entries", "bags", "totalBags").debounce(SUM_DEBOUNCE)]
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::form::DerivedFieldEngine;

    fn entries(quantities: &[&str]) -> FieldValue {
        FieldValue::List(
            quantities
                .iter()
                .map(|q| FormValues::new().with("quantity", FieldValue::text(*q)))
                .collect(),
        )
    }

    fn purchase_engine() -> DerivedFieldEngine {
        let engine = DerivedFieldEngine::new();
        engine
            .register_rule(conditional_sum(
                "paddy-quantity",
                "purchaseType",
                "weighbridge",
                "entries",
                "quantity",
                "totalQuantity",
            ))
            .unwrap();
        engine
    }

    #[test]
    fn sum_skips_blank_entries() {
        let engine = DerivedFieldEngine::new();
        engine
            .register_rule(sum_entries("sum", "entries", "quantity", "total"))
            .unwrap();

        engine.set_field("entries", entries(&["10", "", "5.5"]));
        assert_eq!(engine.values().display("total"), "15.5");

        engine.set_field("entries", entries(&["abc", "4"]));
        assert_eq!(engine.values().display("total"), "4");
    }

    #[test]
    fn all_empty_entries_render_blank() {
        let engine = DerivedFieldEngine::new();
        engine
            .register_rule(sum_entries("sum", "entries", "quantity", "total"))
            .unwrap();

        engine.set_field("entries", entries(&["", "", ""]));
        assert_eq!(engine.values().display("total"), "");
    }

    #[test]
    fn conditional_switch_clears_and_unlocks() {
        let engine = purchase_engine();
        engine.set_field("purchaseType", FieldValue::text("weighbridge"));
        engine.set_field("entries", entries(&["10", "", "5.5"]));
        assert_eq!(engine.values().display("totalQuantity"), "15.5");
        assert!(engine.flags("totalQuantity").read_only);

        // Weighbridge -> manual: cleared once, editable.
        engine.set_field("purchaseType", FieldValue::text("manual"));
        assert_eq!(engine.values().display("totalQuantity"), "");
        assert!(!engine.flags("totalQuantity").read_only);

        // User types a quantity; entry edits must not clobber it.
        engine.set_field("totalQuantity", FieldValue::text("99"));
        engine.set_field("entries", entries(&["1"]));
        assert_eq!(engine.values().display("totalQuantity"), "99");

        // Back to weighbridge with a single entry of 20.
        engine.set_field("entries", entries(&["20"]));
        engine.set_field("purchaseType", FieldValue::text("weighbridge"));
        assert_eq!(engine.values().display("totalQuantity"), "20");
        assert!(engine.flags("totalQuantity").read_only);
    }

    #[test]
    fn edit_mode_keeps_stored_manual_quantity() {
        let engine = purchase_engine();
        engine.load(
            FormValues::new()
                .with("purchaseType", FieldValue::text("manual"))
                .with("totalQuantity", FieldValue::number(42.0)),
        );
        engine.prime();
        assert_eq!(engine.values().display("totalQuantity"), "42");
        assert!(!engine.flags("totalQuantity").read_only);
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_sum_settles_after_typing_stops() {
        let engine = DerivedFieldEngine::new();
        engine
            .register_rule(
                sum_entries("sum", "entries", "quantity", "total")
                    .debounce(Duration::from_millis(250)),
            )
            .unwrap();

        engine.set_field("entries", entries(&["1"]));
        tokio::time::sleep(Duration::from_millis(100)).await;
        engine.set_field("entries", entries(&["12"]));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(engine.values().display("total"), "");

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(engine.values().display("total"), "12");
    }

    #[test]
    fn ledger_rule_sets_register_cleanly() {
        use strum::IntoEnumIterator;

        for ledger in Ledger::iter() {
            let engine = DerivedFieldEngine::new();
            for rule in for_ledger(ledger) {
                engine.register_rule(rule).unwrap();
            }
        }
    }

    #[test]
    fn purchase_form_primes_weighbridge_total() {
        let engine = DerivedFieldEngine::new();
        for rule in for_ledger(Ledger::PaddyPurchases) {
            engine.register_rule(rule).unwrap();
        }
        engine.load(
            FormValues::new()
                .with("purchaseType", FieldValue::text("weighbridge"))
                .with("purchaseVia", FieldValue::text("broker"))
                .with("entries", entries(&["12.5", "7.5"])),
        );
        engine.prime();

        assert_eq!(engine.values().display("totalQuantity"), "20");
        assert_eq!(engine.required_missing(), vec!["brokerName".to_owned()]);
    }

    #[test]
    fn branch_field_is_required_only_in_branch() {
        let engine = DerivedFieldEngine::new();
        engine
            .register_rule(branch_field("broker", "viaBroker", "yes", "brokerName"))
            .unwrap();

        engine.set_field("viaBroker", FieldValue::text("yes"));
        assert_eq!(engine.required_missing(), vec!["brokerName".to_owned()]);
        engine.set_field("brokerName", FieldValue::text("Suresh"));

        engine.set_field("viaBroker", FieldValue::text("no"));
        assert!(engine.flags("brokerName").hidden);
        assert_eq!(engine.values().display("brokerName"), "");
        assert!(engine.required_missing().is_empty());
    }
}
