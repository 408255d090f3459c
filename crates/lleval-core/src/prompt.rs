//! Judge prompt assembly.
//!
//! Templates use positional placeholders: `{}` takes the next argument,
//! `{N}` the N-th one; `{{` and `}}` are literal braces.

use crate::config::load_document;
use crate::errors::{EvalError, EvalResult};
use crate::model::Dimension;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub init_prompt: String,
    pub task_prompt: String,
    pub context_prompt: String,
    pub candidate_prompt: String,
    pub eval_prompt: String,
    pub post_prompt: String,
    /// Pairwise templates keyed by dimension name, filled with (context, response 1, response 2).
    #[serde(default)]
    pub pairwise: BTreeMap<String, String>,
}

impl PromptTemplate {
    pub fn load(path: &Path) -> EvalResult<Self> {
        load_document(path)
    }

    pub fn format_context(
        &self,
        dimension: &Dimension,
        turns: &[String],
        knowledge: &[String],
    ) -> String {
        let mut out = String::new();
        if dimension.use_history {
            let n = dimension.history_turns;
            let turns = if n > 0 && turns.len() > n {
                &turns[turns.len() - n..]
            } else {
                turns
            };
            out.push_str("## Conversation\n");
            // The last turn is always the user's.
            let user_parity = (turns.len() + 1) % 2;
            for (i, turn) in turns.iter().enumerate() {
                let speaker = if i % 2 == user_parity {
                    "User"
                } else {
                    "Assistant"
                };
                out.push_str(speaker);
                out.push_str(": ");
                out.push_str(turn);
                out.push(' ');
            }
        }
        if dimension.use_knowledge {
            out.push_str("\n\n## Provided Knowledge\n");
            for line in knowledge {
                out.push_str(line);
                out.push(' ');
            }
        }
        out
    }

    /// Prompt asking for a 1..=5 rating of `output` on `dimension`.
    pub fn likert_prompt(
        &self,
        dimension: &Dimension,
        output: &str,
        turns: &[String],
        knowledge: &[String],
        task_description: &str,
    ) -> EvalResult<String> {
        let context = self.format_context(dimension, turns, knowledge);
        let mut prompt = String::new();
        prompt.push_str(&self.init_prompt);
        prompt.push_str(&self.task_prompt);
        prompt.push(' ');
        prompt.push_str(&dimension.description);
        prompt.push(' ');
        prompt.push_str(task_description);
        prompt.push_str(&fill(&self.context_prompt, &[&context])?);
        prompt.push_str("\n\n");
        prompt.push_str(&fill(&self.candidate_prompt, &[output])?);
        prompt.push_str("\n\n");
        prompt.push_str(&fill(&self.eval_prompt, &[&dimension.capitalized_name()])?);
        prompt.push_str(&self.post_prompt);
        Ok(prompt)
    }

    /// Prompt asking which of two responses is better on `dimension`.
    pub fn pairwise_prompt(
        &self,
        dimension: &Dimension,
        turns: &[String],
        knowledge: &[String],
        response_1: &str,
        response_2: &str,
    ) -> EvalResult<String> {
        let template = self.pairwise.get(&dimension.name).ok_or_else(|| {
            EvalError::config(format!(
                "no pairwise template for dimension '{}'",
                dimension.name
            ))
        })?;
        let context = self.format_context(dimension, turns, knowledge);
        fill(template, &[&context, response_1, response_2])
    }
}

/// Fill positional placeholders in `template`.
pub fn fill(template: &str, args: &[&str]) -> EvalResult<String> {
    let mut out = String::with_capacity(template.len() + args.iter().map(|a| a.len()).sum::<usize>());
    let mut next_auto = 0usize;
    let mut chars = template.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                out.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut field = String::new();
                let mut closed = false;
                for (_, fc) in chars.by_ref() {
                    if fc == '}' {
                        closed = true;
                        break;
                    }
                    field.push(fc);
                }
                if !closed {
                    return Err(EvalError::template(format!(
                        "unclosed '{{' at byte {}",
                        pos
                    )));
                }
                let index = if field.is_empty() {
                    let i = next_auto;
                    next_auto += 1;
                    i
                } else {
                    field.trim().parse::<usize>().map_err(|_| {
                        EvalError::template(format!("unsupported placeholder '{{{}}}'", field))
                    })?
                };
                let arg = args.get(index).ok_or_else(|| {
                    EvalError::template(format!(
                        "placeholder {} needs argument {} but only {} given",
                        pos,
                        index,
                        args.len()
                    ))
                })?;
                out.push_str(arg);
            }
            '}' => {
                return Err(EvalError::template(format!(
                    "single '}}' at byte {}",
                    pos
                )));
            }
            _ => out.push(c),
        }
    }
    Ok(out)
}
