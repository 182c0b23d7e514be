use std::collections::BTreeSet;

use tracing::warn;

/// Membership mode shared by the index and name selector flavours.
///
/// The grammar produces exactly one of these: `*` yields [`SelectorMode::All`],
/// a `!`-prefixed list yields [`SelectorMode::Exclude`], and a plain list
/// yields [`SelectorMode::Include`]. An empty input yields an empty
/// `Include`, which enables nothing — distinct from `*`, which enables
/// everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorMode<T: Ord> {
    All,
    Include(BTreeSet<T>),
    Exclude(BTreeSet<T>),
}

impl<T: Ord> SelectorMode<T> {
    fn contains(&self, value: &T) -> bool {
        match self {
            SelectorMode::All => true,
            SelectorMode::Include(set) => set.contains(value),
            SelectorMode::Exclude(set) => !set.contains(value),
        }
    }
}

/// Selector over 0-based row or sheet indices.
///
/// Tracks the minimum and maximum index ever added alongside the membership
/// set; export-time footer placement relies on those bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSelector {
    mode: SelectorMode<u32>,
    min: Option<u32>,
    max: Option<u32>,
}

impl IndexSelector {
    /// Selector that enables every index.
    pub fn all() -> Self {
        Self {
            mode: SelectorMode::All,
            min: None,
            max: None,
        }
    }

    /// Selector that enables nothing.
    pub fn none() -> Self {
        Self {
            mode: SelectorMode::Include(BTreeSet::new()),
            min: None,
            max: None,
        }
    }

    /// Selector enabling exactly the given indices.
    pub fn of(indices: impl IntoIterator<Item = u32>) -> Self {
        let mut selector = Self::none();
        for index in indices {
            selector.add(index);
        }
        selector
    }

    /// Parse the compact range/list grammar.
    ///
    /// `*` matches everything; a leading `!` negates the remaining list;
    /// tokens are `,`- or `|`-delimited and are either a single integer or an
    /// inclusive range `a-b` (auto-swapped when reversed). `start_by` shifts
    /// human-authored 1-based indices down to the 0-based internal form.
    /// Malformed tokens and tokens below `start_by` are logged and skipped;
    /// they never abort parsing of the remaining tokens.
    pub fn parse(input: &str, start_by: u32) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::none();
        }
        if trimmed == "*" {
            return Self::all();
        }

        let (negated, body) = match trimmed.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let mut selector = Self::none();
        for token in crate::split_list(body) {
            if token.is_empty() {
                continue;
            }
            match parse_index_token(token) {
                Some((lo, hi)) => {
                    for raw in lo..=hi {
                        if raw < start_by {
                            warn!(token, raw, start_by, "selector index below start offset; skipped");
                            continue;
                        }
                        selector.add(raw - start_by);
                    }
                }
                None => warn!(token, "malformed selector token; skipped"),
            }
        }

        if negated {
            selector.mode = match selector.mode {
                SelectorMode::Include(set) => SelectorMode::Exclude(set),
                other => other,
            };
        }
        selector
    }

    fn add(&mut self, index: u32) {
        self.min = Some(self.min.map_or(index, |m| m.min(index)));
        self.max = Some(self.max.map_or(index, |m| m.max(index)));
        match &mut self.mode {
            SelectorMode::Include(set) | SelectorMode::Exclude(set) => {
                set.insert(index);
            }
            SelectorMode::All => {}
        }
    }

    /// Whether the given index participates.
    pub fn is_enabled(&self, index: u32) -> bool {
        self.mode.contains(&index)
    }

    /// Smallest index ever added, if any.
    pub fn min(&self) -> Option<u32> {
        self.min
    }

    /// Largest index ever added, if any.
    pub fn max(&self) -> Option<u32> {
        self.max
    }

    pub fn is_all(&self) -> bool {
        matches!(self.mode, SelectorMode::All)
    }

    /// True when the selector can never enable anything.
    pub fn is_empty(&self) -> bool {
        matches!(&self.mode, SelectorMode::Include(set) if set.is_empty())
    }

    /// Sorted explicit indices. `All` and `Exclude` selectors have no
    /// enumerable membership and yield nothing.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        match &self.mode {
            SelectorMode::Include(set) => Some(set.iter().copied()),
            _ => None,
        }
        .into_iter()
        .flatten()
    }

    pub fn mode(&self) -> &SelectorMode<u32> {
        &self.mode
    }
}

/// Parse one index token into an inclusive `(lo, hi)` pair.
fn parse_index_token(token: &str) -> Option<(u32, u32)> {
    if let Some((a, b)) = token.split_once('-') {
        let a: u32 = a.trim().parse().ok()?;
        let b: u32 = b.trim().parse().ok()?;
        Some((a.min(b), a.max(b)))
    } else {
        let v: u32 = token.parse().ok()?;
        Some((v, v))
    }
}

/// Selector over sheet names. Same `*` / `!` / list grammar as
/// [`IndexSelector`], without ranges or offset handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSelector {
    mode: SelectorMode<String>,
}

impl NameSelector {
    pub fn all() -> Self {
        Self {
            mode: SelectorMode::All,
        }
    }

    pub fn none() -> Self {
        Self {
            mode: SelectorMode::Include(BTreeSet::new()),
        }
    }

    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::none();
        }
        if trimmed == "*" {
            return Self::all();
        }

        let (negated, body) = match trimmed.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let set: BTreeSet<String> = crate::split_list(body)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect();
        let mode = if negated {
            SelectorMode::Exclude(set)
        } else {
            SelectorMode::Include(set)
        };
        Self { mode }
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        match &self.mode {
            SelectorMode::All => true,
            SelectorMode::Include(set) => set.contains(name),
            SelectorMode::Exclude(set) => !set.contains(name),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self.mode, SelectorMode::All)
    }

    pub fn mode(&self) -> &SelectorMode<String> {
        &self.mode
    }
}
