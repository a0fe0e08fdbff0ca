//! Composition of metastore decorators.

use crate::Metastore;
use std::sync::Arc;
use tracing::debug;

/// A cross-cutting layer that wraps a metastore.
pub trait MetastoreDecorator: Send + Sync {
    /// Layers with a higher priority wrap those with a lower one.
    fn priority(&self) -> i32;

    fn name(&self) -> &str;

    fn decorate(&self, inner: Arc<dyn Metastore>) -> Arc<dyn Metastore>;
}

/// Wrap `inner` in every decorator.
///
/// Decorators are applied in ascending priority, so the lowest priority sits
/// closest to `inner` and the highest receives calls first. Equal priorities
/// keep their registration order.
pub fn decorate_metastore(
    inner: Arc<dyn Metastore>,
    decorators: &[Arc<dyn MetastoreDecorator>],
) -> Arc<dyn Metastore> {
    let mut ordered: Vec<&Arc<dyn MetastoreDecorator>> = decorators.iter().collect();
    ordered.sort_by_key(|d| d.priority());
    ordered.into_iter().fold(inner, |metastore, decorator| {
        debug!(
            decorator = decorator.name(),
            priority = decorator.priority(),
            "Applying metastore decorator"
        );
        decorator.decorate(metastore)
    })
}


#[cfg(test)]
mod prop_tests {
    use super::tests::labeling_decorator;
    use super::*;
    use crate::InMemoryMetastore;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_chain_order_is_stable_priority_order(priorities in prop::collection::vec(-3i32..3, 0..8)) {
            let labels: Vec<&'static str> =
                ["a", "b", "c", "d", "e", "f", "g", "h"][..priorities.len()].to_vec();
            let decorators: Vec<Arc<dyn MetastoreDecorator>> = labels
                .iter()
                .zip(&priorities)
                .map(|(label, priority)| labeling_decorator(*label, *priority))
                .collect();
            let decorated = decorate_metastore(Arc::new(InMemoryMetastore::new()), &decorators);

            let mut expected: Vec<(i32, &str)> =
                priorities.iter().copied().zip(labels.iter().copied()).collect();
            expected.sort_by_key(|(priority, _)| *priority);
            let expected: Vec<String> =
                expected.into_iter().map(|(_, label)| label.to_string()).collect();
            prop_assert_eq!(decorated.get_all_databases().unwrap(), expected);
        }
    }
}
