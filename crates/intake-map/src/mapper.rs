//! Phased header mapping.
//!
//! Matching runs as four phases in fixed precedence: overrides, exact
//! synonym match, split date/time detection, fuzzy containment. Each phase
//! reads an immutable pool of the headers and fields still unclaimed and
//! returns its claims; the next pool is derived from the previous one minus
//! those claims. No phase can see or undo another phase's work.

use std::collections::{BTreeMap, BTreeSet};

use intake_model::{
    Ambiguity, CanonicalField, FieldMapping, IssueKind, MatchKind, SplitMapping,
};
use tracing::debug;

use crate::synonyms::SynonymTable;
use crate::utils::{contains_either, normalize_text};

/// Shortest header or phrase length that counts as containment evidence in
/// the fuzzy phase.
const FUZZY_MIN_LEN: usize = 3;

#[derive(Debug, Clone)]
struct Column {
    index: usize,
    header: String,
    normalized: String,
}

/// Headers and fields available to one phase.
#[derive(Debug, Clone)]
struct Pool<'a> {
    columns: Vec<&'a Column>,
    fields: Vec<CanonicalField>,
}

impl<'a> Pool<'a> {
    fn has_field(&self, field: CanonicalField) -> bool {
        self.fields.contains(&field)
    }

    /// The pool left after removing everything `claims` consumed.
    fn without(&self, claims: &[Claim]) -> Pool<'a> {
        let used_columns: BTreeSet<usize> = claims.iter().flat_map(Claim::columns).collect();
        let used_fields: BTreeSet<CanonicalField> = claims.iter().map(Claim::field).collect();
        Pool {
            columns: self
                .columns
                .iter()
                .copied()
                .filter(|c| !used_columns.contains(&c.index))
                .collect(),
            fields: self
                .fields
                .iter()
                .copied()
                .filter(|f| !used_fields.contains(f))
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
enum Claim {
    Direct {
        column: usize,
        header: String,
        field: CanonicalField,
        kind: MatchKind,
    },
    Split {
        columns: Vec<usize>,
        split: SplitMapping,
    },
}

impl Claim {
    fn direct(column: &Column, field: CanonicalField, kind: MatchKind) -> Self {
        Claim::Direct {
            column: column.index,
            header: column.header.clone(),
            field,
            kind,
        }
    }

    fn field(&self) -> CanonicalField {
        match self {
            Claim::Direct { field, .. } => *field,
            Claim::Split { split, .. } => split.field,
        }
    }

    fn columns(&self) -> Vec<usize> {
        match self {
            Claim::Direct { column, .. } => vec![*column],
            Claim::Split { columns, .. } => columns.clone(),
        }
    }
}

/// Everything the mapper resolved for one header row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingOutcome {
    pub mapping: FieldMapping,
    pub splits: Vec<SplitMapping>,
    pub ambiguities: Vec<Ambiguity>,
    /// Headers no phase claimed, in column order.
    pub unmapped_headers: Vec<String>,
    /// How each mapped field was resolved.
    pub provenance: BTreeMap<CanonicalField, MatchKind>,
}

impl MappingOutcome {
    pub fn split_for(&self, field: CanonicalField) -> Option<&SplitMapping> {
        self.splits.iter().find(|s| s.field == field)
    }

    /// True when `field` has a direct column or a split mapping.
    pub fn is_mapped(&self, field: CanonicalField) -> bool {
        self.split_for(field).is_some() || self.mapping.contains_field(field)
    }

    /// Required fields with neither a direct nor a split mapping.
    pub fn missing_required(&self) -> Vec<CanonicalField> {
        CanonicalField::required()
            .filter(|field| !self.is_mapped(*field))
            .collect()
    }

    /// Mean confidence over mapped fields.
    pub fn confidence_average(&self) -> Option<f64> {
        if self.provenance.is_empty() {
            return None;
        }
        let sum: f64 = self.provenance.values().map(MatchKind::confidence).sum();
        Some(sum / self.provenance.len() as f64)
    }

    /// Ambiguity and non-schema warnings for this mapping.
    pub fn structural_issues(&self) -> Vec<IssueKind> {
        let mut issues: Vec<IssueKind> = self
            .ambiguities
            .iter()
            .map(|a| IssueKind::AmbiguousHeader {
                field: a.field,
                candidates: a.candidates.clone(),
                chosen: a.chosen.clone(),
            })
            .collect();
        if !self.unmapped_headers.is_empty() {
            issues.push(IssueKind::NonSchemaHeaders {
                headers: self.unmapped_headers.clone(),
            });
        }
        issues
    }

    /// Removes any split backing `field`, along with its composite entry.
    pub fn drop_split(&mut self, field: CanonicalField) -> Option<SplitMapping> {
        let position = self.splits.iter().position(|s| s.field == field)?;
        let split = self.splits.remove(position);
        if self.mapping.get(&split.composite_key()) == Some(field) {
            self.mapping.release_field(field);
        }
        self.provenance.remove(&field);
        Some(split)
    }
}

fn matches_fragment(column: &Column, fragments: &[String]) -> bool {
    !column.normalized.is_empty()
        && fragments
            .iter()
            .any(|f| contains_either(&column.normalized, f))
}

/// Resolves headers to canonical fields.
///
/// The mapper never fails: irregularities surface as ambiguities and
/// unmapped headers for later stages to report.
#[derive(Debug, Clone)]
pub struct HeaderMapper<'a> {
    synonyms: &'a SynonymTable,
    overrides: BTreeMap<String, CanonicalField>,
}

impl<'a> HeaderMapper<'a> {
    pub fn new(synonyms: &'a SynonymTable) -> Self {
        Self {
            synonyms,
            overrides: BTreeMap::new(),
        }
    }

    /// Header text to field key. Entries naming an unknown field are skipped.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, String>) -> Self {
        for (header, key) in overrides {
            match key.parse::<CanonicalField>() {
                Ok(field) => {
                    self.overrides.entry(normalize_text(header)).or_insert(field);
                }
                Err(_) => debug!(header = %header, field = %key, "ignoring override for unknown field"),
            }
        }
        self
    }

    /// Runs every phase over `headers`.
    pub fn map_headers(&self, headers: &[String]) -> MappingOutcome {
        let mut seen = BTreeSet::new();
        let mut duplicates = BTreeSet::new();
        let columns: Vec<Column> = headers
            .iter()
            .enumerate()
            .filter_map(|(index, header)| {
                if seen.insert(header.as_str()) {
                    Some(Column {
                        index,
                        header: header.clone(),
                        normalized: normalize_text(header),
                    })
                } else {
                    duplicates.insert(index);
                    None
                }
            })
            .collect();

        let initial = Pool {
            columns: columns.iter().collect(),
            fields: CanonicalField::ALL.to_vec(),
        };

        let overrides = self.override_phase(&initial);
        let after_overrides = initial.without(&overrides);
        let exact = self.exact_phase(&after_overrides);
        let after_exact = after_overrides.without(&exact);
        let splits = self.split_phase(&after_exact);
        let after_splits = after_exact.without(&splits);
        let (fuzzy, ambiguities) = self.fuzzy_phase(&after_splits);
        let remaining = after_splits.without(&fuzzy);

        debug!(
            overrides = overrides.len(),
            exact = exact.len(),
            splits = splits.len(),
            fuzzy = fuzzy.len(),
            ambiguous = ambiguities.len(),
            "header mapping phases complete"
        );

        let mut outcome = MappingOutcome {
            ambiguities,
            ..Default::default()
        };
        for claim in overrides.into_iter().chain(exact).chain(splits).chain(fuzzy) {
            match claim {
                Claim::Direct {
                    header,
                    field,
                    kind,
                    ..
                } => {
                    outcome.mapping.insert(header, field);
                    outcome.provenance.insert(field, kind);
                }
                Claim::Split { split, .. } => {
                    outcome.mapping.insert(split.composite_key(), split.field);
                    outcome.provenance.insert(split.field, MatchKind::Split);
                    outcome.splits.push(split);
                }
            }
        }

        let unclaimed: BTreeSet<usize> = remaining.columns.iter().map(|c| c.index).collect();
        outcome.unmapped_headers = headers
            .iter()
            .enumerate()
            .filter(|(index, _)| unclaimed.contains(index) || duplicates.contains(index))
            .map(|(_, header)| header.clone())
            .collect();
        outcome
    }

    fn override_phase(&self, pool: &Pool<'_>) -> Vec<Claim> {
        let mut taken = BTreeSet::new();
        let mut claims = Vec::new();
        for column in &pool.columns {
            let Some(field) = self.overrides.get(&column.normalized).copied() else {
                continue;
            };
            if !pool.has_field(field) || !taken.insert(field) {
                debug!(header = %column.header, %field, "override ignored, field already claimed");
                continue;
            }
            claims.push(Claim::direct(column, field, MatchKind::Override));
        }
        claims
    }

    fn exact_phase(&self, pool: &Pool<'_>) -> Vec<Claim> {
        let mut used = BTreeSet::new();
        let mut claims = Vec::new();
        for field in &pool.fields {
            let phrases = self.synonyms.phrases(*field);
            let hit = pool.columns.iter().find(|c| {
                !used.contains(&c.index) && phrases.iter().any(|p| *p == c.normalized)
            });
            if let Some(column) = hit {
                used.insert(column.index);
                claims.push(Claim::direct(column, *field, MatchKind::Exact));
            }
        }
        claims
    }

    fn split_phase(&self, pool: &Pool<'_>) -> Vec<Claim> {
        let mut used = BTreeSet::new();
        let mut claims = Vec::new();
        for (field, fragments) in self.synonyms.splits() {
            if !pool.has_field(field) {
                continue;
            }
            let Some(date) = pool
                .columns
                .iter()
                .find(|c| !used.contains(&c.index) && matches_fragment(c, &fragments.date))
            else {
                continue;
            };
            let time = pool.columns.iter().find(|c| {
                c.index != date.index && !used.contains(&c.index) && matches_fragment(c, &fragments.time)
            });

            used.insert(date.index);
            let mut columns = vec![date.index];
            if let Some(time) = time {
                used.insert(time.index);
                columns.push(time.index);
            }
            claims.push(Claim::Split {
                columns,
                split: SplitMapping {
                    field,
                    date_header: date.header.clone(),
                    time_header: time.map(|t| t.header.clone()),
                },
            });
        }
        claims
    }

    fn fuzzy_phase(&self, pool: &Pool<'_>) -> (Vec<Claim>, Vec<Ambiguity>) {
        let mut used = BTreeSet::new();
        let mut claims = Vec::new();
        let mut ambiguities = Vec::new();
        for field in &pool.fields {
            let phrases: Vec<&String> = self
                .synonyms
                .phrases(*field)
                .iter()
                .filter(|p| p.chars().count() >= FUZZY_MIN_LEN)
                .collect();
            let candidates: Vec<&Column> = pool
                .columns
                .iter()
                .copied()
                .filter(|c| {
                    !used.contains(&c.index)
                        && c.normalized.chars().count() >= FUZZY_MIN_LEN
                        && phrases.iter().any(|p| contains_either(&c.normalized, p))
                })
                .collect();

            let chosen = match candidates.as_slice() {
                [] => continue,
                [single] => {
                    claims.push(Claim::direct(single, *field, MatchKind::Fuzzy));
                    *single
                }
                many => {
                    // min_by_key keeps the first of equal keys, so column order breaks ties.
                    let Some(pick) = many
                        .iter()
                        .copied()
                        .min_by_key(|c| c.header.trim().chars().count())
                    else {
                        continue;
                    };
                    debug!(%field, candidates = many.len(), chosen = %pick.header, "ambiguous header match");
                    ambiguities.push(Ambiguity {
                        field: *field,
                        candidates: many.iter().map(|c| c.header.clone()).collect(),
                        chosen: pick.header.clone(),
                    });
                    claims.push(Claim::direct(pick, *field, MatchKind::AmbiguousFallback));
                    pick
                }
            };
            used.insert(chosen.index);
        }
        (claims, ambiguities)
    }
}
