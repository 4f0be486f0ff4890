//! `data-source` expressions for the data-binding helper
//!
//! An expression is `<file>.<dot.separated.path>`, e.g.
//! `budget_data.grant_periods[2].total`. Each segment may carry one numeric
//! index. `length` applied to an array yields its size.

use crate::error::VerifyError;
use crate::format::{format_value, DataFormat};
use futures::future::{join_all, FutureExt, LocalBoxFuture, Shared};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;

lazy_static! {
    /// `name` or `name[3]`
    static ref SEGMENT_PATTERN: Regex = Regex::new(r"^([^\[\]]+)(?:\[(\d+)\])?$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub key: String,
    pub index: Option<usize>,
}

/// Parsed `data-source` attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceExpr {
    pub file: String,
    pub segments: Vec<PathSegment>,
}

impl SourceExpr {
    pub fn parse(expr: &str) -> Result<Self, VerifyError> {
        let expr = expr.trim();
        let (file, path) = expr
            .split_once('.')
            .ok_or_else(|| VerifyError::InvalidSource(expr.to_string()))?;
        if file.is_empty() || path.is_empty() {
            return Err(VerifyError::InvalidSource(expr.to_string()));
        }

        let segments = path
            .split('.')
            .map(|part| {
                let caps = SEGMENT_PATTERN
                    .captures(part)
                    .ok_or_else(|| VerifyError::InvalidSource(expr.to_string()))?;
                let index = match caps.get(2) {
                    Some(m) => Some(
                        m.as_str()
                            .parse::<usize>()
                            .map_err(|_| VerifyError::InvalidSource(expr.to_string()))?,
                    ),
                    None => None,
                };
                Ok(PathSegment {
                    key: caps[1].to_string(),
                    index,
                })
            })
            .collect::<Result<Vec<_>, VerifyError>>()?;

        Ok(Self {
            file: file.to_string(),
            segments,
        })
    }

    /// Dot path without the file prefix, for messages
    pub fn path(&self) -> String {
        self.segments
            .iter()
            .map(|s| match s.index {
                Some(i) => format!("{}[{}]", s.key, i),
                None => s.key.clone(),
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Walk the path through a loaded document
    pub fn resolve(&self, doc: &Value) -> Result<Value, VerifyError> {
        resolve_path(doc, &self.segments).ok_or_else(|| VerifyError::PathNotFound {
            file: self.file.clone(),
            path: self.path(),
        })
    }
}

pub fn resolve_path(doc: &Value, segments: &[PathSegment]) -> Option<Value> {
    let mut current = doc;
    for (i, segment) in segments.iter().enumerate() {
        match current.get(&segment.key) {
            Some(next) => current = next,
            None if segment.key == "length" && segment.index.is_none() => {
                let len = current.as_array()?.len();
                // `length` only makes sense as the last segment
                return (i == segments.len() - 1).then(|| Value::from(len));
            }
            None => return None,
        }
        if let Some(index) = segment.index {
            current = current.get(index)?;
        }
    }
    Some(current.clone())
}

/// Loaded data files, one fetch per file per page load
#[derive(Debug, Default)]
pub struct DataCache {
    files: HashMap<String, Option<Value>>,
}

impl DataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files referenced by `exprs` that have not been fetched yet, in first
    /// appearance order and without duplicates
    pub fn pending<'a>(&self, exprs: impl IntoIterator<Item = &'a SourceExpr>) -> Vec<String> {
        let mut pending: Vec<String> = Vec::new();
        for expr in exprs {
            if !self.files.contains_key(&expr.file) && !pending.contains(&expr.file) {
                pending.push(expr.file.clone());
            }
        }
        pending
    }

    /// Record a fetch outcome; failures are remembered so they are not retried
    pub fn insert(&mut self, file: &str, result: Result<Value, VerifyError>) {
        let entry = match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Data file {} unavailable: {}", file, e);
                None
            }
        };
        self.files.insert(file.to_string(), entry);
    }

    pub fn contains(&self, file: &str) -> bool {
        self.files.contains_key(file)
    }

    pub fn get(&self, file: &str) -> Option<&Value> {
        self.files.get(file).and_then(Option::as_ref)
    }

    /// Text for an element, or `None` to leave it unmodified
    pub fn render(&self, expr: &SourceExpr, format: DataFormat) -> Option<String> {
        let doc = self.get(&expr.file)?;
        match expr.resolve(doc) {
            Ok(value) => {
                let text = format_value(&value, format);
                if text.is_none() {
                    tracing::warn!(
                        "{}.{} is not a displayable value",
                        expr.file,
                        expr.path()
                    );
                }
                text
            }
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        }
    }
}

type InFlight = Shared<LocalBoxFuture<'static, ()>>;

/// Shared front for [`DataCache`] that overlapping binds can use together
///
/// A file being fetched is tracked until its result lands in the cache, and
/// later callers wait on that fetch instead of starting their own.
#[derive(Clone, Default)]
pub struct DataLoader {
    cache: Rc<RefCell<DataCache>>,
    in_flight: Rc<RefCell<HashMap<String, InFlight>>>,
}

impl DataLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every file referenced by `exprs` available in the cache
    pub async fn load<'a, F, Fut>(&self, exprs: impl IntoIterator<Item = &'a SourceExpr>, mut fetch: F)
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<Value, VerifyError>> + 'static,
    {
        let pending = self.cache.borrow().pending(exprs);
        let mut waits = Vec::with_capacity(pending.len());

        for file in pending {
            let existing = self.in_flight.borrow().get(&file).cloned();
            let wait = match existing {
                Some(wait) => wait,
                None => {
                    let fetched = fetch(file.clone());
                    let cache = Rc::clone(&self.cache);
                    let in_flight = Rc::clone(&self.in_flight);
                    let name = file.clone();
                    let task = async move {
                        let result = fetched.await;
                        cache.borrow_mut().insert(&name, result);
                        in_flight.borrow_mut().remove(&name);
                    }
                    .boxed_local()
                    .shared();
                    self.in_flight.borrow_mut().insert(file, task.clone());
                    task
                }
            };
            waits.push(wait);
        }

        join_all(waits).await;
    }

    pub fn is_loading(&self, file: &str) -> bool {
        self.in_flight.borrow().contains_key(file)
    }

    pub fn render(&self, expr: &SourceExpr, format: DataFormat) -> Option<String> {
        self.cache.borrow().render(expr, format)
    }

    pub fn contains(&self, file: &str) -> bool {
        self.cache.borrow().contains(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn budget() -> Value {
        json!({
            "total": 62985.5,
            "grant_periods": [
                {"name": "GP1", "amount": 10300},
                {"name": "GP2", "amount": 52685.5}
            ],
            "meta": {"countries": ["PT", "ES", "IT"]}
        })
    }

    #[test]
    fn test_parse_simple() {
        let expr = SourceExpr::parse("budget_data.total").unwrap();
        assert_eq!(expr.file, "budget_data");
        assert_eq!(
            expr.segments,
            vec![PathSegment {
                key: "total".to_string(),
                index: None
            }]
        );
    }

    #[test]
    fn test_parse_indexed() {
        let expr = SourceExpr::parse("budget_data.grant_periods[1].amount").unwrap();
        assert_eq!(expr.segments[0].index, Some(1));
        assert_eq!(expr.path(), "grant_periods[1].amount");
    }

    #[test]
    fn test_parse_invalid() {
        for bad in ["", "budget_data", ".total", "budget_data.", "f.a..b", "f.a[x]", "f.a[1][2]"] {
            assert!(
                matches!(SourceExpr::parse(bad), Err(VerifyError::InvalidSource(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_resolve_paths() {
        let doc = budget();
        let amount = SourceExpr::parse("b.grant_periods[1].amount").unwrap();
        assert_eq!(amount.resolve(&doc).unwrap(), json!(52685.5));

        let len = SourceExpr::parse("b.meta.countries.length").unwrap();
        assert_eq!(len.resolve(&doc).unwrap(), json!(3));

        let missing = SourceExpr::parse("b.grant_periods[5].amount").unwrap();
        assert_eq!(
            missing.resolve(&doc).unwrap_err(),
            VerifyError::PathNotFound {
                file: "b".to_string(),
                path: "grant_periods[5].amount".to_string()
            }
        );
    }

    #[test]
    fn test_length_must_be_last() {
        let doc = budget();
        let expr = SourceExpr::parse("b.grant_periods.length.x").unwrap();
        assert!(expr.resolve(&doc).is_err());
    }

    #[test]
    fn test_cache_dedups_files() {
        let exprs: Vec<SourceExpr> = [
            "budget_data.total",
            "members.count",
            "budget_data.grant_periods[0].amount",
            "members.list.length",
        ]
        .iter()
        .map(|e| SourceExpr::parse(e).unwrap())
        .collect();

        let mut cache = DataCache::new();
        assert_eq!(cache.pending(&exprs), vec!["budget_data", "members"]);

        cache.insert("budget_data", Ok(budget()));
        cache.insert("members", Err(VerifyError::Fetch("404".to_string())));
        assert!(cache.pending(&exprs).is_empty());
        assert!(cache.contains("members"));
        assert!(cache.get("members").is_none());
    }

    #[test]
    fn test_render_with_format() {
        let mut cache = DataCache::new();
        cache.insert("budget_data", Ok(budget()));

        let total = SourceExpr::parse("budget_data.total").unwrap();
        assert_eq!(
            cache.render(&total, DataFormat::Currency).as_deref(),
            Some("62,985.50")
        );

        let unknown = SourceExpr::parse("budget_data.nope").unwrap();
        assert_eq!(cache.render(&unknown, DataFormat::Plain), None);

        let object = SourceExpr::parse("budget_data.meta").unwrap();
        assert_eq!(cache.render(&object, DataFormat::Plain), None);

        let unfetched = SourceExpr::parse("other.total").unwrap();
        assert_eq!(cache.render(&unfetched, DataFormat::Plain), None);
    }

    #[test]
    fn test_overlapping_loads_fetch_each_file_once() {
        use futures::channel::oneshot;
        use std::cell::Cell;

        let loader = DataLoader::new();
        let calls = Rc::new(Cell::new(0));
        let (release, gate) = oneshot::channel::<()>();
        let gate = Rc::new(RefCell::new(Some(gate)));

        let fetch = |file: String| {
            calls.set(calls.get() + 1);
            let gate = gate.borrow_mut().take();
            async move {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                assert_eq!(file, "budget_data");
                Ok(budget())
            }
        };

        let first = vec![SourceExpr::parse("budget_data.total").unwrap()];
        let second = vec![
            SourceExpr::parse("budget_data.grant_periods.length").unwrap(),
            SourceExpr::parse("budget_data.total").unwrap(),
        ];

        futures::executor::block_on(async {
            let opened = async {
                assert!(loader.is_loading("budget_data"));
                let _ = release.send(());
            };
            futures::join!(loader.load(&first, fetch), loader.load(&second, fetch), opened);
        });

        assert_eq!(calls.get(), 1);
        assert!(!loader.is_loading("budget_data"));
        assert_eq!(
            loader.render(&second[0], DataFormat::Plain).as_deref(),
            Some("2")
        );

        futures::executor::block_on(loader.load(&first, fetch));
        assert_eq!(calls.get(), 1);
    }
}
