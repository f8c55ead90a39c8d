//! One namespace for every user-visible object. Lookup crosses kinds, so an instrument and
//! a chord can never share a name; insertion order is preserved for listing.

/// What a name refers to. The payload is an index into the compiler's store for that kind,
/// which stays valid for the whole compilation (objects are never removed).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum SymbolKind {
    Instrument(usize),
    DrumKey(usize),
    Chord(usize),
    Arp(usize),
    Macro(usize),
}

#[derive(Clone, Debug, Default)]
pub(crate) struct SymbolTable {
    entries: Vec<(String, SymbolKind)>,
}

impl SymbolTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a name. Returns `false`, leaving the table unchanged, when the name is
    /// already in use by an object of any kind.
    pub(crate) fn insert<S: Into<String>>(&mut self, name: S, kind: SymbolKind) -> bool {
        let name = name.into();
        if self.lookup(&name).is_some() {
            return false;
        }
        self.entries.push((name, kind));
        true
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<SymbolKind> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, kind)| *kind)
    }

    /// All entries in insertion order.
    #[allow(dead_code)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, SymbolKind)> {
        self.entries.iter().map(|(name, kind)| (name.as_str(), *kind))
    }
}

#[test]
fn duplicate_names_are_rejected_across_kinds() {
    let mut table = SymbolTable::new();
    assert!(table.insert("piano", SymbolKind::Instrument(0)));
    assert!(!table.insert("piano", SymbolKind::Chord(3)));
    // the first registration is unchanged
    assert_eq!(Some(SymbolKind::Instrument(0)), table.lookup("piano"));
}

#[test]
fn iteration_preserves_insertion_order() {
    let mut table = SymbolTable::new();
    table.insert("b", SymbolKind::Macro(0));
    table.insert("a", SymbolKind::Arp(1));
    table.insert("c", SymbolKind::DrumKey(2));
    let names: Vec<&str> = table.iter().map(|(name, _)| name).collect();
    assert_eq!(vec!["b", "a", "c"], names);
}

#[test]
fn lookup_missing_name() {
    let table = SymbolTable::new();
    assert_eq!(None, table.lookup("nope"));
}
