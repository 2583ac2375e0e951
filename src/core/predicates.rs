use serde_json::{json, Map, Value};

use crate::models::{Filters, Listing, ListingField, PredicateSet, RangeFilter, StructuredIntent, TextPredicate};

const PHRASE_FIELDS: [ListingField; 3] = [ListingField::Title, ListingField::Description, ListingField::Company];
const KEYWORD_FIELDS: [ListingField; 2] = [ListingField::Title, ListingField::Description];

/// Turn a structured intent into match predicates layered on top of the
/// caller's filters.
///
/// Caller filters are copied through untouched; this only ever adds.
pub fn build(intent: &StructuredIntent, base_filters: &Filters) -> PredicateSet {
    let mut any_of = Vec::new();

    let phrase = intent.improved_query.trim();
    if !phrase.is_empty() {
        for field in PHRASE_FIELDS {
            push_unique(&mut any_of, TextPredicate::Contains { field, pattern: phrase.to_string() });
        }
    }

    if intent.used_external_service {
        for keyword in intent.keywords.iter().map(|k| k.trim()).filter(|k| !k.is_empty()) {
            for field in KEYWORD_FIELDS {
                push_unique(&mut any_of, TextPredicate::Contains { field, pattern: keyword.to_string() });
            }
        }

        if let Some(title) = intent.job_title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            push_unique(
                &mut any_of,
                TextPredicate::Contains { field: ListingField::Title, pattern: title.to_string() },
            );
        }

        for skill in intent.skills.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            push_unique(&mut any_of, TextPredicate::HasSkill { pattern: skill.to_string() });
        }
    }

    let ranges = intent
        .job_level
        .map(|level| {
            let (min, max) = level.experience_range();
            vec![RangeFilter { field: ListingField::ExperienceRequired, min, max }]
        })
        .unwrap_or_default();

    PredicateSet {
        base: base_filters.clone(),
        any_of,
        ranges,
    }
}

fn push_unique(predicates: &mut Vec<TextPredicate>, predicate: TextPredicate) {
    if !predicates.contains(&predicate) {
        predicates.push(predicate);
    }
}

impl PredicateSet {
    /// Render as a store query document.
    ///
    /// Base filters stay at the top level; the OR-group and ranges are added
    /// under `$and`, extending an existing `$and` array if the caller sent one.
    pub fn to_document(&self) -> Value {
        let mut doc = self.base.clone();

        let mut clauses = Vec::new();
        if !self.any_of.is_empty() {
            let alternatives: Vec<Value> = self.any_of.iter().map(text_clause).collect();
            clauses.push(json!({ "$or": alternatives }));
        }
        for range in &self.ranges {
            clauses.push(range_clause(range));
        }

        if !clauses.is_empty() {
            match doc.remove("$and") {
                Some(Value::Array(mut existing)) => {
                    existing.extend(clauses);
                    doc.insert("$and".to_string(), Value::Array(existing));
                }
                Some(other) => {
                    let mut all = vec![other];
                    all.extend(clauses);
                    doc.insert("$and".to_string(), Value::Array(all));
                }
                None => {
                    doc.insert("$and".to_string(), Value::Array(clauses));
                }
            }
        }

        Value::Object(doc)
    }

    /// Evaluate the predicates against a listing.
    ///
    /// Base filters are compared by equality against the listing's serialized
    /// fields; operator keys (`$...`) are left to the store and ignored here.
    pub fn matches(&self, listing: &Listing) -> bool {
        if !self.base.is_empty() {
            let fields = match serde_json::to_value(listing) {
                Ok(Value::Object(fields)) => fields,
                _ => Map::new(),
            };
            let base_ok = self
                .base
                .iter()
                .filter(|(key, _)| !key.starts_with('$'))
                .all(|(key, expected)| fields.get(key) == Some(expected));
            if !base_ok {
                return false;
            }
        }

        if !self.any_of.is_empty() && !self.any_of.iter().any(|p| text_matches(p, listing)) {
            return false;
        }

        self.ranges.iter().all(|range| {
            let value = match range.field {
                ListingField::ExperienceRequired => listing.experience_required,
                _ => return false,
            };
            value >= range.min && range.max.map_or(true, |max| value <= max)
        })
    }
}

fn text_clause(predicate: &TextPredicate) -> Value {
    match predicate {
        TextPredicate::Contains { field, pattern } => {
            json!({ (field.as_str()): { "$regex": regex::escape(pattern), "$options": "i" } })
        }
        TextPredicate::HasSkill { pattern } => json!({
            (ListingField::Skills.as_str()): {
                "$elemMatch": { "$regex": regex::escape(pattern), "$options": "i" }
            }
        }),
    }
}

fn range_clause(range: &RangeFilter) -> Value {
    let mut bounds = Map::new();
    bounds.insert("$gte".to_string(), json!(range.min));
    if let Some(max) = range.max {
        bounds.insert("$lte".to_string(), json!(max));
    }
    json!({ (range.field.as_str()): bounds })
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn text_matches(predicate: &TextPredicate, listing: &Listing) -> bool {
    match predicate {
        TextPredicate::Contains { field, pattern } => match field {
            ListingField::Title => contains_ci(&listing.title, pattern),
            ListingField::Description => contains_ci(&listing.description, pattern),
            ListingField::Company => contains_ci(&listing.company, pattern),
            ListingField::Skills => listing.skills.iter().any(|s| contains_ci(s, pattern)),
            ListingField::ExperienceRequired => false,
        },
        TextPredicate::HasSkill { pattern } => listing.skills.iter().any(|s| contains_ci(s, pattern)),
    }
}
