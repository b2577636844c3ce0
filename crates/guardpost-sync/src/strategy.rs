//! Caching strategies, one per resource class.

use crate::cache::CacheNamespace;
use crate::resource::{ResourceClass, ResourceKind};

/// How a request is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Serve from cache and refresh the copy silently for the next load; on a
    /// miss fetch and populate.
    CacheFirst(CacheNamespace),
    /// Cache-first with network fallback; a failed fetch yields a placeholder.
    CacheFirstWithPlaceholder(CacheNamespace),
    /// Serve the cached copy now and refresh it in the background; without a
    /// cached copy wait for the network.
    StaleWhileRevalidate(CacheNamespace),
    /// Never cached. Transient failures of a queueable kind are queued.
    NetworkOnly {
        /// Queue used when the request cannot reach the server.
        queue: Option<ResourceKind>,
    },
}

impl Strategy {
    /// The strategy serving `class`.
    ///
    /// # Examples
    /// ```
    /// use guardpost_sync::{CacheNamespace, ResourceClass, Strategy};
    ///
    /// assert_eq!(
    ///     Strategy::for_class(ResourceClass::CacheableRead),
    ///     Strategy::StaleWhileRevalidate(CacheNamespace::Api),
    /// );
    /// ```
    #[must_use]
    pub const fn for_class(class: ResourceClass) -> Self {
        match class {
            ResourceClass::StaticShell => Self::CacheFirst(CacheNamespace::Static),
            ResourceClass::Image => Self::CacheFirstWithPlaceholder(CacheNamespace::Images),
            ResourceClass::CacheableRead => Self::StaleWhileRevalidate(CacheNamespace::Api),
            ResourceClass::Mutation(queue) => Self::NetworkOnly { queue },
            ResourceClass::Passthrough => Self::NetworkOnly { queue: None },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ResourceClass::StaticShell, Strategy::CacheFirst(CacheNamespace::Static))]
    #[case(
        ResourceClass::Image,
        Strategy::CacheFirstWithPlaceholder(CacheNamespace::Images)
    )]
    #[case(
        ResourceClass::Mutation(Some(ResourceKind::Payroll)),
        Strategy::NetworkOnly { queue: Some(ResourceKind::Payroll) }
    )]
    #[case(ResourceClass::Passthrough, Strategy::NetworkOnly { queue: None })]
    fn classes_map_to_strategies(#[case] class: ResourceClass, #[case] expected: Strategy) {
        assert_eq!(Strategy::for_class(class), expected);
    }
}
