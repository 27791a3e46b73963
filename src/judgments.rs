//! Relevance judgments (qrels) keyed by query and document.
//!
//! The store is filled once while loading the judgments file and is only
//! read afterwards. A document that was never judged for a query has
//! grade 0; a query that was never loaded is an error.

use crate::error::{EvalError, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, info};

/// Query identifier.
pub type QueryId = u32;

/// Document identifier.
pub type DocumentId = u64;

/// Graded relevance; 0 means not relevant.
pub type Grade = u32;

/// Graded relevance judgments for every loaded query.
///
/// Queries iterate in ascending ID order; documents within a query are
/// looked up by hash.
#[derive(Debug, Clone, Default)]
pub struct RelevanceStore {
    queries: BTreeMap<QueryId, HashMap<DocumentId, Grade>>,
}

impl RelevanceStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a query, even if it ends up with no judged documents.
    pub fn add_query(&mut self, query: QueryId) {
        self.queries.entry(query).or_default();
    }

    /// Record a judgment. Returns the previous grade if the pair was
    /// already judged; the new grade replaces it.
    pub fn insert(&mut self, query: QueryId, document: DocumentId, grade: Grade) -> Option<Grade> {
        self.queries
            .entry(query)
            .or_default()
            .insert(document, grade)
    }

    /// Whether the query was loaded.
    pub fn contains_query(&self, query: QueryId) -> bool {
        self.queries.contains_key(&query)
    }

    /// All loaded query IDs in ascending order.
    pub fn query_ids(&self) -> impl Iterator<Item = QueryId> + '_ {
        self.queries.keys().copied()
    }

    /// Number of loaded queries.
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Check if no query was loaded.
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Total number of (query, document) judgments, including grade 0.
    pub fn judgment_count(&self) -> usize {
        self.queries.values().map(HashMap::len).sum()
    }

    /// All judgments for a query.
    pub fn judgments_of(&self, query: QueryId) -> Result<&HashMap<DocumentId, Grade>> {
        self.queries
            .get(&query)
            .ok_or(EvalError::MissingQuery(query))
    }

    /// Grade of a document for a query, 0 if it was never judged.
    pub fn relevance_of(&self, query: QueryId, document: DocumentId) -> Result<Grade> {
        Ok(self
            .judgments_of(query)?
            .get(&document)
            .copied()
            .unwrap_or(0))
    }

    /// Documents with grade > 0 for a query.
    pub fn relevant_documents_of(&self, query: QueryId) -> Result<BTreeSet<DocumentId>> {
        Ok(self
            .judgments_of(query)?
            .iter()
            .filter(|(_, grade)| **grade > 0)
            .map(|(doc, _)| *doc)
            .collect())
    }

    /// Number of documents with grade > 0 for a query.
    pub fn num_relevant(&self, query: QueryId) -> Result<usize> {
        Ok(self
            .judgments_of(query)?
            .values()
            .filter(|grade| **grade > 0)
            .count())
    }

    /// Judged documents ordered best-first: grade descending, then
    /// document ID ascending so ties always resolve the same way.
    pub fn ideal_ranking(&self, query: QueryId) -> Result<Vec<(DocumentId, Grade)>> {
        let mut ranking: Vec<(DocumentId, Grade)> = self
            .judgments_of(query)?
            .iter()
            .map(|(doc, grade)| (*doc, *grade))
            .collect();
        ranking.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        Ok(ranking)
    }
}

/// Load a judgments file.
pub fn load_qrels(path: &Path) -> Result<RelevanceStore> {
    if !path.is_file() {
        return Err(EvalError::JudgmentsNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|e| EvalError::io(path, e))?;
    let store = parse_qrels(&content, path)?;

    info!(
        path = %path.display(),
        queries = store.len(),
        judgments = store.judgment_count(),
        "loaded relevance judgments"
    );
    Ok(store)
}

/// Parse judgments in the `queryID:docID,grade docID,grade ...` layout.
///
/// Pairs may also be written as `(docID,grade)`. `origin` is only used
/// to label errors.
pub fn parse_qrels(content: &str, origin: &Path) -> Result<RelevanceStore> {
    let mut store = RelevanceStore::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (query_part, pairs_part) = line
            .split_once(':')
            .ok_or_else(|| EvalError::malformed(origin, line_no, "missing ':' after query ID"))?;

        let query: QueryId = query_part.trim().parse().map_err(|_| {
            EvalError::malformed(
                origin,
                line_no,
                format!("invalid query ID '{}'", query_part.trim()),
            )
        })?;
        store.add_query(query);

        let pairs = pairs_part
            .split(|c: char| c.is_whitespace() || c == '(' || c == ')')
            .filter(|token| !token.is_empty());

        for pair in pairs {
            let (document, grade) = parse_pair(pair)
                .ok_or_else(|| EvalError::malformed(origin, line_no, format!("invalid pair '{pair}'")))?;

            if let Some(previous) = store.insert(query, document, grade) {
                debug!(query, document, previous, grade, "duplicate judgment, keeping last");
            }
        }
    }

    Ok(store)
}

fn parse_pair(pair: &str) -> Option<(DocumentId, Grade)> {
    let (document, grade) = pair.split_once(',')?;
    if grade.contains(',') {
        return None;
    }
    Some((document.trim().parse().ok()?, grade.trim().parse().ok()?))
}
