//! Per-unit table of synthesized identifiers.
//!
//! Names are handed out by requested base name. The first binding to ask for
//! a base gets it verbatim, later bindings get `base1`, `base2`, ... in request
//! order. Asking again for the same binding returns the name it already has.

use ferry_types::{NodeId, SymbolId};
use std::collections::{HashMap, HashSet};

/// Identity of the binding a synthetic name stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKey {
    Symbol(SymbolId),
    /// A construct with no symbol of its own, e.g. a destructured parameter.
    Node(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Binding(BindingKey),
    /// A rank skipped because the user already wrote that name.
    Taken,
}

#[derive(Debug, Default, Clone)]
pub struct RenameTable {
    groups: HashMap<String, Vec<Slot>>,
    user_names: HashSet<String>,
}

impl RenameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a name written in the source; synthesized names avoid it.
    pub fn reserve(&mut self, name: &str) {
        self.user_names.insert(name.to_string());
    }

    /// The synthetic name for `key`, allocating one if needed.
    pub fn request(&mut self, base: &str, key: BindingKey) -> String {
        let group = self.groups.entry(base.to_string()).or_default();
        if let Some(rank) = group.iter().position(|s| *s == Slot::Binding(key)) {
            return spelled(base, rank);
        }
        loop {
            let rank = group.len();
            let name = spelled(base, rank);
            if self.user_names.contains(&name) {
                group.push(Slot::Taken);
                continue;
            }
            group.push(Slot::Binding(key));
            log::trace!("rename: {base} -> {name}");
            return name;
        }
    }

    /// Every allocated name as `((base, rank), name)`, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = ((&str, usize), String)> + '_ {
        self.groups.iter().flat_map(|(base, slots)| {
            slots.iter().enumerate().filter_map(move |(rank, slot)| match slot {
                Slot::Binding(_) => Some(((base.as_str(), rank), spelled(base, rank))),
                Slot::Taken => None,
            })
        })
    }
}

fn spelled(base: &str, rank: usize) -> String {
    if rank == 0 {
        base.to_string()
    } else {
        format!("{base}{rank}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_types::UnitId;

    #[test]
    fn test_first_request_gets_base_name() {
        let mut table = RenameTable::new();
        let a = BindingKey::Node(NodeId(1));
        let b = BindingKey::Node(NodeId(2));
        assert_eq!(table.request("element", a), "element");
        assert_eq!(table.request("element", b), "element1");
        assert_eq!(table.request("element", a), "element");
        assert_eq!(table.request("element", b), "element1");
    }

    #[test]
    fn test_distinct_symbols_collide() {
        let mut table = RenameTable::new();
        let first = BindingKey::Symbol(SymbolId::new(UnitId(0), 4));
        let second = BindingKey::Symbol(SymbolId::new(UnitId(0), 9));
        let third = BindingKey::Node(NodeId(4));
        assert_eq!(table.request("self", first), "self");
        assert_eq!(table.request("self", second), "self1");
        assert_eq!(table.request("self", third), "self2");
    }

    #[test]
    fn test_bases_are_independent() {
        let mut table = RenameTable::new();
        assert_eq!(table.request("error", BindingKey::Node(NodeId(1))), "error");
        assert_eq!(table.request("element", BindingKey::Node(NodeId(2))), "element");
        assert_eq!(table.entries().count(), 2);
    }

    #[test]
    fn test_user_names_are_skipped() {
        let mut table = RenameTable::new();
        table.reserve("element");
        table.reserve("element2");
        assert_eq!(table.request("element", BindingKey::Node(NodeId(1))), "element1");
        assert_eq!(table.request("element", BindingKey::Node(NodeId(2))), "element3");
        let mut ranks: Vec<usize> = table.entries().map(|((_, rank), _)| rank).collect();
        ranks.sort();
        assert_eq!(ranks, vec![1, 3]);
    }
}
