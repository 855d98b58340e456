//! `RoutingTable` and its validating builder.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::domain::formats::FormatTag;

/// Errors raised while building or querying a routing table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("no route from {from} to {to}")]
    NotFound { from: String, to: String },

    #[error("{from} lists {to} as an equivalent but no route is registered")]
    MissingRoute { from: String, to: String },

    #[error("route {from} -> {to} is registered but not listed as an equivalent")]
    UnlistedRoute { from: String, to: String },

    #[error("{from} -> {to} is declared more than once")]
    Duplicate { from: String, to: String },
}

impl RoutingError {
    fn not_found(source: impl FormatTag, target: impl FormatTag) -> Self {
        RoutingError::NotFound {
            from: source.to_string(),
            to: target.to_string(),
        }
    }

    /// Returns true for errors that indicate an inconsistent table
    /// declaration rather than a failed lookup.
    pub fn is_configuration_defect(&self) -> bool {
        !matches!(self, RoutingError::NotFound { .. })
    }
}

/// Immutable mapping of (source, target) pairs to conversion operations.
///
/// Invariant: for every source, `equivalents(source)` lists exactly the
/// targets for which `route(source, target)` succeeds.
#[derive(Debug, Clone)]
pub struct RoutingTable<S, T, Op> {
    equivalents: BTreeMap<S, Vec<T>>,
    routes: BTreeMap<(S, T), Op>,
}

impl<S: FormatTag, T: FormatTag, Op> RoutingTable<S, T, Op> {
    /// Starts declaring a new table.
    pub fn builder() -> RoutingTableBuilder<S, T, Op> {
        RoutingTableBuilder::default()
    }

    /// Targets the user may choose for `source`, in presentation order.
    ///
    /// Empty for sources without any route.
    pub fn equivalents(&self, source: S) -> &[T] {
        self.equivalents
            .get(&source)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Looks up the operation converting `source` into `target`.
    ///
    /// Returns `RoutingError::NotFound` when `target` is not an equivalent of
    /// `source`; it never falls back to a different route.
    pub fn route(&self, source: S, target: T) -> Result<&Op, RoutingError> {
        self.routes
            .get(&(source, target))
            .ok_or_else(|| RoutingError::not_found(source, target))
    }

    /// Returns true when `target` is offered for `source`.
    pub fn supports(&self, source: S, target: T) -> bool {
        self.routes.contains_key(&(source, target))
    }

    /// Sources that have at least one route.
    pub fn sources(&self) -> impl Iterator<Item = S> + '_ {
        self.equivalents.keys().copied()
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Collects equivalents and routes, validating them in [`build`](Self::build).
#[derive(Debug)]
pub struct RoutingTableBuilder<S, T, Op> {
    equivalents: Vec<(S, Vec<T>)>,
    routes: Vec<((S, T), Op)>,
}

impl<S, T, Op> Default for RoutingTableBuilder<S, T, Op> {
    fn default() -> Self {
        Self {
            equivalents: Vec::new(),
            routes: Vec::new(),
        }
    }
}

impl<S: FormatTag, T: FormatTag, Op> RoutingTableBuilder<S, T, Op> {
    /// Declares the targets offered for `source`, in button order.
    pub fn equivalents(mut self, source: S, targets: impl IntoIterator<Item = T>) -> Self {
        self.equivalents.push((source, targets.into_iter().collect()));
        self
    }

    /// Registers the operation for one (source, target) pair.
    pub fn route(mut self, source: S, target: T, op: Op) -> Self {
        self.routes.push(((source, target), op));
        self
    }

    /// Validates the declaration and produces the table.
    ///
    /// Fails when a pair is declared twice, when an equivalent has no route,
    /// or when a route is not listed as an equivalent.
    pub fn build(self) -> Result<RoutingTable<S, T, Op>, RoutingError> {
        let mut equivalents: BTreeMap<S, Vec<T>> = BTreeMap::new();
        let mut listed: BTreeSet<(S, T)> = BTreeSet::new();

        for (source, targets) in self.equivalents {
            if equivalents.contains_key(&source) {
                let to = targets.first().map(|t| t.to_string()).unwrap_or_default();
                return Err(RoutingError::Duplicate {
                    from: source.to_string(),
                    to,
                });
            }
            for target in &targets {
                if !listed.insert((source, *target)) {
                    return Err(RoutingError::Duplicate {
                        from: source.to_string(),
                        to: target.to_string(),
                    });
                }
            }
            equivalents.insert(source, targets);
        }

        let mut routes: BTreeMap<(S, T), Op> = BTreeMap::new();
        for ((source, target), op) in self.routes {
            if !listed.contains(&(source, target)) {
                return Err(RoutingError::UnlistedRoute {
                    from: source.to_string(),
                    to: target.to_string(),
                });
            }
            if routes.insert((source, target), op).is_some() {
                return Err(RoutingError::Duplicate {
                    from: source.to_string(),
                    to: target.to_string(),
                });
            }
        }

        if let Some((source, target)) = listed.iter().find(|pair| !routes.contains_key(*pair)) {
            return Err(RoutingError::MissingRoute {
                from: source.to_string(),
                to: target.to_string(),
            });
        }

        equivalents.retain(|_, targets| !targets.is_empty());

        Ok(RoutingTable {
            equivalents,
            routes,
        })
    }
}
