//! Removing legacy filter drivers from device class filter lists

use super::registry_access;
use crate::tables::{FILTER_VALUES, LEGACY_FILTERS};
use crate::OpsCtx;
use pvdrv_config::constants::CLASS_KEY;
use pvdrv_errors::Error;
use pvdrv_events::{AppEvent, CleanupEvent, EventEmitter};
use pvdrv_platform::{RegKeyPath, RegValue};

/// Split `entries` into the ones to keep and the ones naming a filter in
/// `remove` (case-insensitive). Both halves keep their original order.
#[must_use]
pub fn strip_filters(entries: &[String], remove: &[&str]) -> (Vec<String>, Vec<String>) {
    entries
        .iter()
        .cloned()
        .partition(|entry| !remove.iter().any(|f| f.eq_ignore_ascii_case(entry)))
}

pub(super) async fn remove_from_filters(ctx: &OpsCtx) -> Result<(), Error> {
    let registry = ctx.platform.registry();
    let base = RegKeyPath::native(CLASS_KEY);
    let classes = registry
        .subkeys(&base)
        .await
        .map_err(|e| registry_access(&base, &e))?;

    for class in classes {
        let key = base.join(&class);
        for value_name in FILTER_VALUES {
            let Some(value) = registry.get_value(&key, value_name).await? else {
                continue;
            };
            let Some(entries) = value.as_multi_string() else {
                continue;
            };

            let (kept, removed) = strip_filters(entries, &LEGACY_FILTERS);
            if removed.is_empty() {
                continue;
            }
            registry
                .set_value(&key, value_name, &RegValue::MultiString(kept))
                .await?;
            ctx.emit(AppEvent::Cleanup(CleanupEvent::FiltersRewritten {
                class_key: key.to_string(),
                value: value_name.to_string(),
                removed,
            }));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn legacy_filters_are_dropped() {
        let (kept, removed) =
            strip_filters(&strings(&["xenfilt", "storvsc", "scsifilt"]), &LEGACY_FILTERS);
        assert_eq!(kept, strings(&["storvsc"]));
        assert_eq!(removed, strings(&["xenfilt", "scsifilt"]));
    }

    #[test]
    fn match_ignores_case() {
        let (kept, removed) = strip_filters(&strings(&["XENFILT", "PartMgr"]), &LEGACY_FILTERS);
        assert_eq!(kept, strings(&["PartMgr"]));
        assert_eq!(removed, strings(&["XENFILT"]));
    }

    fn entry() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("xenfilt".to_string()),
            Just("XenFilt".to_string()),
            Just("scsifilt".to_string()),
            "[a-zA-Z]{1,10}",
        ]
    }

    proptest! {
        #[test]
        fn kept_entries_preserve_order_and_exclude_filters(
            entries in prop::collection::vec(entry(), 0..12)
        ) {
            let (kept, removed) = strip_filters(&entries, &LEGACY_FILTERS);

            prop_assert_eq!(kept.len() + removed.len(), entries.len());
            for entry in &kept {
                prop_assert!(!LEGACY_FILTERS.iter().any(|f| f.eq_ignore_ascii_case(entry)));
            }
            let expected: Vec<String> = entries
                .iter()
                .filter(|e| !LEGACY_FILTERS.iter().any(|f| f.eq_ignore_ascii_case(e)))
                .cloned()
                .collect();
            prop_assert_eq!(kept, expected);
        }
    }
}
