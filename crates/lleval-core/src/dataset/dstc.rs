//! DSTC9 / DSTC11 track "knowledge-grounded dialogue" splits.
//!
//! A split directory holds `knowledge.json`, `labels.json` and `logs.json`.
//! DSTC11 labels reference review sentences and FAQs
//! (`doc_type` + `sent_id`); DSTC9 labels carry neither and point at FAQ-style
//! `docs` with `title` / `body`.

use super::DataCollector;
use crate::config::load_document;
use crate::errors::{EvalError, EvalResult};
use crate::model::SampleContext;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Entity, document and sentence ids appear both as integers and strings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(untagged)]
enum Key {
    Int(i64),
    Text(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{}", i),
            Key::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct KnowledgeRef {
    domain: String,
    entity_id: Key,
    doc_id: Key,
    #[serde(default)]
    doc_type: Option<String>,
    #[serde(default)]
    sent_id: Option<Key>,
}

#[derive(Debug, Clone, Deserialize)]
struct Label {
    target: bool,
    #[serde(default)]
    knowledge: Vec<KnowledgeRef>,
    #[serde(default)]
    response: String,
}

#[derive(Debug, Clone, Deserialize)]
struct LogTurn {
    speaker: String,
    text: String,
}

/// A knowledge reference after DSTC9 normalization, in grouping order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Snippet {
    entity_id: Key,
    doc_type: String,
    doc_id: Key,
    sent_id: Option<Key>,
    domain: String,
}

impl Snippet {
    fn same_doc(&self, other: &Snippet) -> bool {
        self.entity_id == other.entity_id
            && self.doc_type == other.doc_type
            && self.doc_id == other.doc_id
    }
}

pub struct DstcDataCollector {
    name: String,
    split_dir: PathBuf,
    knowledge: serde_json::Value,
    labels: Vec<Label>,
    logs: Vec<Vec<LogTurn>>,
    /// Upper bound on knowledge snippets per sample; `None` keeps all.
    pub max_sentences: Option<usize>,
    /// Trailing log turns kept per sample; `None` keeps all.
    pub max_turns: Option<usize>,
}

impl DstcDataCollector {
    /// Load `<base_path>/<split>/{knowledge,labels,logs}.json`.
    pub fn open(base_path: impl AsRef<Path>, split: &str) -> EvalResult<Self> {
        let split_dir = base_path.as_ref().join(split);
        if !split_dir.is_dir() {
            return Err(EvalError::config(format!(
                "dataset split directory not found: {}",
                split_dir.display()
            )));
        }
        let knowledge = load_document(&split_dir.join("knowledge.json"))?;
        let labels: Vec<Label> = load_document(&split_dir.join("labels.json"))?;
        let logs: Vec<Vec<LogTurn>> = load_document(&split_dir.join("logs.json"))?;
        if labels.len() != logs.len() {
            return Err(EvalError::LengthMismatch {
                what: "logs.json",
                expected: labels.len(),
                actual: logs.len(),
            });
        }
        debug!(split = %split_dir.display(), samples = labels.len(), "loaded DSTC split");

        let dataset = base_path
            .as_ref()
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("dstc");
        Ok(Self {
            name: format!("{}/{}", dataset, split),
            split_dir,
            knowledge,
            labels,
            logs,
            max_sentences: Some(10),
            max_turns: Some(10),
        })
    }

    pub fn with_max_sentences(mut self, max_sentences: Option<usize>) -> Self {
        self.max_sentences = max_sentences;
        self
    }

    pub fn with_max_turns(mut self, max_turns: Option<usize>) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn split_dir(&self) -> &Path {
        &self.split_dir
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Indices of knowledge-seeking turns (`target == true`).
    pub fn samples_with_target(&self) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, l)| l.target)
            .map(|(i, _)| i)
            .collect()
    }

    fn label(&self, index: usize) -> EvalResult<&Label> {
        self.labels.get(index).ok_or(EvalError::SampleOutOfRange {
            index,
            len: self.labels.len(),
        })
    }

    fn knowledge_lines(&self, refs: &[KnowledgeRef]) -> EvalResult<Vec<String>> {
        let legacy = refs.first().is_some_and(|r| r.doc_type.is_none());
        let mut snippets: Vec<Snippet> = refs
            .iter()
            .map(|r| Snippet {
                entity_id: r.entity_id.clone(),
                doc_type: if legacy {
                    "faq".to_string()
                } else {
                    r.doc_type.clone().unwrap_or_else(|| "faq".to_string())
                },
                doc_id: r.doc_id.clone(),
                sent_id: if legacy {
                    Some(Key::Int(0))
                } else {
                    r.sent_id.clone()
                },
                domain: r.domain.clone(),
            })
            .collect();
        snippets.sort();
        if let Some(max) = self.max_sentences {
            snippets.truncate(max);
        }

        let mut lines = Vec::new();
        let mut group: Vec<&Snippet> = Vec::new();
        for snippet in &snippets {
            if group.last().is_some_and(|prev| !prev.same_doc(snippet)) {
                lines.push(self.render_group(&group, legacy)?);
                group.clear();
            }
            group.push(snippet);
        }
        if !group.is_empty() {
            lines.push(self.render_group(&group, legacy)?);
        }
        Ok(lines)
    }

    fn render_group(&self, group: &[&Snippet], legacy: bool) -> EvalResult<String> {
        let first = group[0];
        let entity = self.entity(&first.domain, &first.entity_id)?;
        let entity_name = match entity.get("name") {
            Some(serde_json::Value::String(name)) => name.clone(),
            _ => first.domain.clone(),
        };

        if first.doc_type == "faq" {
            let (collection, q_key, a_key) = if legacy {
                ("docs", "title", "body")
            } else {
                ("faqs", "question", "answer")
            };
            let doc = lookup(entity, &[collection, &first.doc_id.to_string()])
                .ok_or_else(|| missing(first, None))?;
            let question = text_field(doc, q_key).ok_or_else(|| missing(first, Some(q_key)))?;
            let answer = text_field(doc, a_key).ok_or_else(|| missing(first, Some(a_key)))?;
            return Ok(format!(":F: ({}) {} {}", entity_name, question, answer));
        }

        let collection = format!("{}s", first.doc_type);
        let doc_id = first.doc_id.to_string();
        let mut sentences = Vec::with_capacity(group.len());
        for snippet in group {
            let sent_id = snippet
                .sent_id
                .as_ref()
                .map(Key::to_string)
                .unwrap_or_else(|| "0".to_string());
            let text = lookup(entity, &[&collection, &doc_id, "sentences", &sent_id])
                .and_then(|v| v.as_str())
                .ok_or_else(|| missing(snippet, Some(&sent_id)))?;
            sentences.push(text);
        }
        Ok(format!(":R: ({}) {}", entity_name, sentences.join(" ")))
    }

    fn entity(&self, domain: &str, entity_id: &Key) -> EvalResult<&serde_json::Value> {
        lookup(&self.knowledge, &[domain, &entity_id.to_string()]).ok_or_else(|| {
            EvalError::MissingKnowledge {
                reference: format!("{}/{}", domain, entity_id),
            }
        })
    }

    fn turns(&self, index: usize) -> Vec<String> {
        let log = &self.logs[index];
        let start = self
            .max_turns
            .map(|max| log.len().saturating_sub(max))
            .unwrap_or(0);
        log[start..]
            .iter()
            .filter(|t| t.speaker == "U" || t.speaker == "S")
            .map(|t| t.text.clone())
            .collect()
    }
}

impl DataCollector for DstcDataCollector {
    fn name(&self) -> &str {
        &self.name
    }

    fn collect_sample_contexts(&self, sample_indices: &[usize]) -> EvalResult<Vec<SampleContext>> {
        let mut contexts = Vec::with_capacity(sample_indices.len());
        for &index in sample_indices {
            let label = self.label(index)?;
            if !label.target {
                return Err(EvalError::NonTargetSample { index });
            }
            contexts.push(SampleContext {
                index,
                reference: label.response.clone(),
                turns: self.turns(index),
                knowledge: self.knowledge_lines(&label.knowledge)?,
            });
        }
        Ok(contexts)
    }
}

fn lookup<'a>(root: &'a serde_json::Value, path: &[&str]) -> Option<&'a serde_json::Value> {
    path.iter().try_fold(root, |node, key| node.get(*key))
}

fn text_field<'a>(doc: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    doc.get(key).and_then(|v| v.as_str())
}

fn missing(snippet: &Snippet, field: Option<&str>) -> EvalError {
    let mut reference = format!(
        "{}/{}/{}/{}",
        snippet.domain, snippet.entity_id, snippet.doc_type, snippet.doc_id
    );
    if let Some(field) = field {
        reference.push('/');
        reference.push_str(field);
    }
    EvalError::MissingKnowledge { reference }
}
