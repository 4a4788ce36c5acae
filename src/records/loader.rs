//! Parsers for prediction, groundtruth, alias and needle-position files
//!
//! `parse_*` functions work on file contents; `load_*` read the file first and
//! attach the path to any error.

use anyhow::{bail, Context, Result};
use std::path::Path;

use super::{AnswerRecord, ExpectedAnswer};
use crate::scoring::AliasTable;

const PROMPT_PREFIX: &str = "Prompt:";
const OUTPUT_PREFIX: &str = "Output:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Prompt,
    Output,
}

/// A prediction block being assembled
#[derive(Debug)]
struct PartialRecord {
    id: u64,
    prompt: Option<String>,
    output: Option<String>,
    last: Option<Field>,
}

impl PartialRecord {
    fn new(id: u64) -> Self {
        Self {
            id,
            prompt: None,
            output: None,
            last: None,
        }
    }

    fn set(&mut self, field: Field, text: &str) {
        let text = text.trim().to_string();
        match field {
            Field::Prompt => self.prompt = Some(text),
            Field::Output => self.output = Some(text),
        }
        self.last = Some(field);
    }

    fn append(&mut self, line_no: usize, text: &str) -> Result<()> {
        let target = match self.last {
            Some(Field::Prompt) => self.prompt.as_mut(),
            Some(Field::Output) => self.output.as_mut(),
            None => None,
        };
        match target {
            Some(value) => {
                value.push(' ');
                value.push_str(text);
                Ok(())
            }
            None => bail!(
                "Line {}: text in prediction #{} before any Prompt/Output line",
                line_no,
                self.id
            ),
        }
    }

    fn finish(self) -> Result<AnswerRecord> {
        let prompt = self
            .prompt
            .with_context(|| format!("Prediction #{} has no Prompt line", self.id))?;
        let output = self
            .output
            .with_context(|| format!("Prediction #{} has no Output line", self.id))?;
        Ok(AnswerRecord {
            id: self.id,
            prompt,
            output,
        })
    }
}

/// `#12` → `Some(12)`; anything else is not an id line
fn parse_id_line(line: &str) -> Option<u64> {
    let digits = line.strip_prefix('#')?.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Parse a predictions file into records, in file order
///
/// Multi-line prompts and outputs are joined with single spaces.
pub fn parse_predictions(content: &str) -> Result<Vec<AnswerRecord>> {
    let mut records = Vec::new();
    let mut current: Option<PartialRecord> = None;

    for (i, raw) in content.lines().enumerate() {
        let line_no = i + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(id) = parse_id_line(line) {
            if let Some(done) = current.take() {
                records.push(done.finish()?);
            }
            current = Some(PartialRecord::new(id));
            continue;
        }

        let Some(record) = current.as_mut() else {
            bail!("Line {}: expected a '#<id>' line, found {:?}", line_no, line);
        };

        if let Some(rest) = line.strip_prefix(PROMPT_PREFIX) {
            record.set(Field::Prompt, rest);
        } else if let Some(rest) = line.strip_prefix(OUTPUT_PREFIX) {
            record.set(Field::Output, rest);
        } else {
            record.append(line_no, line)?;
        }
    }

    if let Some(done) = current {
        records.push(done.finish()?);
    }

    Ok(records)
}

/// First double-quoted substring of `text`
pub fn extract_quoted(text: &str) -> Option<String> {
    let (_, rest) = text.split_once('"')?;
    let (quoted, _) = rest.split_once('"')?;
    Some(quoted.to_string())
}

/// Parse a groundtruth file: one expected answer per line
///
/// Every line is a question; lines without a quoted answer yield `None`.
pub fn parse_groundtruth(content: &str) -> Vec<ExpectedAnswer> {
    content.lines().map(|line| extract_quoted(line.trim())).collect()
}

/// Parse an alias file into a table
///
/// The first quoted segment on a line is the canonical answer, the remaining
/// non-blank quoted segments are its aliases.
pub fn parse_aliases(content: &str) -> AliasTable {
    let mut table = AliasTable::new();

    for line in content.lines() {
        let mut quoted = line
            .trim()
            .split('"')
            .skip(1)
            .step_by(2)
            .map(str::trim);

        let Some(canonical) = quoted.next() else {
            continue;
        };
        let aliases: Vec<&str> = quoted.filter(|a| !a.is_empty()).collect();
        table.register(canonical, aliases);
    }

    table
}

/// Parse a needle-position CSV: page number in the second column
pub fn parse_needle_pages(content: &str) -> Result<Vec<u32>> {
    let mut pages = Vec::new();

    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let column = line
            .split(',')
            .nth(1)
            .with_context(|| format!("Line {}: missing page column in {:?}", i + 1, line))?;
        let page: u32 = column
            .trim()
            .parse()
            .with_context(|| format!("Line {}: invalid page number {:?}", i + 1, column))?;
        pages.push(page);
    }

    Ok(pages)
}

fn read(path: &Path, what: &str) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file: {}", what, path.display()))
}

/// Load predictions from a file
pub fn load_predictions(path: &Path) -> Result<Vec<AnswerRecord>> {
    let content = read(path, "predictions")?;
    parse_predictions(&content)
        .with_context(|| format!("Failed to parse predictions file: {}", path.display()))
}

/// Load expected answers from a file
pub fn load_groundtruth(path: &Path) -> Result<Vec<ExpectedAnswer>> {
    let content = read(path, "groundtruth")?;
    let answers = parse_groundtruth(&content);
    let missing = answers.iter().filter(|a| a.is_none()).count();
    if missing > 0 {
        tracing::warn!(
            "{} groundtruth line(s) in {} have no quoted answer",
            missing,
            path.display()
        );
    }
    Ok(answers)
}

/// Load an alias table from a file
pub fn load_aliases(path: &Path) -> Result<AliasTable> {
    let content = read(path, "alias")?;
    let table = parse_aliases(&content);
    tracing::debug!("Loaded aliases for {} answers from {}", table.len(), path.display());
    Ok(table)
}

/// Load needle page positions from a CSV file
pub fn load_needle_pages(path: &Path) -> Result<Vec<u32>> {
    let content = read(path, "needles info")?;
    parse_needle_pages(&content)
        .with_context(|| format!("Failed to parse needles info file: {}", path.display()))
}
