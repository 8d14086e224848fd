//! Parsers for the two file-based external interfaces of spec.md §6: the
//! partition file (`inputs:`/`outputs:`) and the combined input-formula
//! file bundling an explicit DFA table, the outer color formula, its
//! per-color quantifier map and each color's leaf-subformula state set.
//!
//! The front end that would otherwise produce an [`ExplicitDfaTable`] and a
//! [`ColorFormula`] from an LTLf+/PPLTL+ specification is out of scope
//! (spec.md §1); this module only covers what the `-i`/`-p` CLI flags read
//! from disk, in the hand-rolled, line-oriented style of the teacher's own
//! small parsers (`options.rs`'s `FromStr for OnTheFlyLimit`).

use std::collections::HashMap;
use std::str::FromStr;

use crate::automaton::ExplicitDfaTable;
use crate::color::ColorFormula;
use crate::error::{Result, SynthesisError};
use crate::solver::QuantifierKind;

/// The two-line partition file of spec.md §6: the input and output atomic
/// proposition names.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
}

impl FromStr for Partition {
    type Err = SynthesisError;

    fn from_str(input: &str) -> Result<Self> {
        let mut inputs = None;
        let mut outputs = None;
        for line in input.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(rest) = line.strip_prefix("inputs:") {
                inputs = Some(rest.split_whitespace().map(str::to_string).collect());
            } else if let Some(rest) = line.strip_prefix("outputs:") {
                outputs = Some(rest.split_whitespace().map(str::to_string).collect());
            } else {
                return Err(SynthesisError::Malformed(format!("unexpected line in partition file: '{}'", line)));
            }
        }
        Ok(Partition {
            inputs: inputs.ok_or_else(|| SynthesisError::Malformed("partition file missing 'inputs:' line".to_string()))?,
            outputs: outputs
                .ok_or_else(|| SynthesisError::Malformed("partition file missing 'outputs:' line".to_string()))?,
        })
    }
}

/// The parsed contents of the `-i` input-formula file: the explicit DFA
/// table, the outer color formula, its quantifier map (indexed by color
/// id) and, per color, the arena states at which that color's leaf
/// subformula holds.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub table: ExplicitDfaTable,
    pub formula: ColorFormula,
    pub quantifiers: Vec<QuantifierKind>,
    pub color_states: Vec<Vec<usize>>,
    pub f_colors: Vec<usize>,
    pub g_colors: Vec<usize>,
}

/// Splits `input` into named `[section]` blocks, in the order they appear.
fn split_sections(input: &str) -> Vec<(String, String)> {
    let mut sections = Vec::new();
    let mut current_name: Option<String> = None;
    let mut current_body = String::new();
    for line in input.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with('[') && trimmed.ends_with(']') {
            if let Some(name) = current_name.take() {
                sections.push((name, std::mem::take(&mut current_body)));
            }
            current_name = Some(trimmed[1..trimmed.len() - 1].to_string());
        } else if current_name.is_some() {
            current_body.push_str(line);
            current_body.push('\n');
        }
    }
    if let Some(name) = current_name {
        sections.push((name, current_body));
    }
    sections
}

impl FromStr for InputFile {
    type Err = SynthesisError;

    fn from_str(input: &str) -> Result<Self> {
        let sections: HashMap<String, String> = split_sections(input).into_iter().collect();

        let dfa_body = sections
            .get("dfa")
            .ok_or_else(|| SynthesisError::Malformed("input-formula file missing '[dfa]' section".to_string()))?;
        let table: ExplicitDfaTable = dfa_body.parse()?;

        let formula_body = sections
            .get("formula")
            .ok_or_else(|| SynthesisError::Malformed("input-formula file missing '[formula]' section".to_string()))?;
        let formula: ColorFormula = formula_body.trim().parse()?;

        let quantifiers_body = sections.get("quantifiers").ok_or_else(|| {
            SynthesisError::Malformed("input-formula file missing '[quantifiers]' section".to_string())
        })?;
        let quantifiers = parse_quantifiers(quantifiers_body)?;

        let colors_body = sections
            .get("colors")
            .ok_or_else(|| SynthesisError::Malformed("input-formula file missing '[colors]' section".to_string()))?;
        let color_states = parse_color_states(colors_body, quantifiers.len())?;

        let (f_colors, g_colors) = match sections.get("fg") {
            Some(body) => parse_fg(body)?,
            None => (Vec::new(), Vec::new()),
        };

        Ok(InputFile { table, formula, quantifiers, color_states, f_colors, g_colors })
    }
}

fn parse_quantifiers(body: &str) -> Result<Vec<QuantifierKind>> {
    let mut entries: Vec<(usize, QuantifierKind)> = Vec::new();
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut parts = line.split_whitespace();
        let color = parts
            .next()
            .ok_or_else(|| SynthesisError::Malformed(format!("malformed quantifier line: '{}'", line)))?
            .parse::<usize>()
            .map_err(|_| SynthesisError::Malformed(format!("malformed color id in quantifier line: '{}'", line)))?;
        let kind = match parts.next() {
            Some("Forall") => QuantifierKind::Forall,
            Some("Exists") => QuantifierKind::Exists,
            Some("ForallExists") => QuantifierKind::ForallExists,
            Some("ExistsForall") => QuantifierKind::ExistsForall,
            other => {
                return Err(SynthesisError::Malformed(format!("unknown quantifier kind: '{:?}'", other)));
            }
        };
        entries.push((color, kind));
    }
    entries.sort_by_key(|(color, _)| *color);
    let mut quantifiers = Vec::with_capacity(entries.len());
    for (index, (color, kind)) in entries.into_iter().enumerate() {
        if color != index {
            return Err(SynthesisError::Malformed(format!(
                "quantifier map is not contiguous from 0: expected color {}, found {}",
                index, color
            )));
        }
        quantifiers.push(kind);
    }
    Ok(quantifiers)
}

fn parse_color_states(body: &str, num_colors: usize) -> Result<Vec<Vec<usize>>> {
    let mut color_states = vec![None; num_colors];
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (head, rest) = line
            .split_once(':')
            .ok_or_else(|| SynthesisError::Malformed(format!("malformed colors line: '{}'", line)))?;
        let color = head
            .trim()
            .parse::<usize>()
            .map_err(|_| SynthesisError::Malformed(format!("malformed color id in colors line: '{}'", line)))?;
        if color >= num_colors {
            return Err(SynthesisError::Malformed(format!(
                "colors section refers to color {} with no quantifier entry",
                color
            )));
        }
        let mut states = Vec::new();
        for token in rest.split_whitespace() {
            states.push(
                token
                    .parse::<usize>()
                    .map_err(|_| SynthesisError::Malformed(format!("malformed state id '{}'", token)))?,
            );
        }
        color_states[color] = Some(states);
    }
    color_states
        .into_iter()
        .enumerate()
        .map(|(color, states)| states.ok_or_else(|| SynthesisError::Malformed(format!("colors section missing entry for color {}", color))))
        .collect()
}

fn parse_fg(body: &str) -> Result<(Vec<usize>, Vec<usize>)> {
    let mut f_colors = Vec::new();
    let mut g_colors = Vec::new();
    for line in body.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix("f:") {
            for token in rest.split_whitespace() {
                f_colors.push(
                    token
                        .parse::<usize>()
                        .map_err(|_| SynthesisError::Malformed(format!("malformed color id '{}'", token)))?,
                );
            }
        } else if let Some(rest) = line.strip_prefix("g:") {
            for token in rest.split_whitespace() {
                g_colors.push(
                    token
                        .parse::<usize>()
                        .map_err(|_| SynthesisError::Malformed(format!("malformed color id '{}'", token)))?,
                );
            }
        } else {
            return Err(SynthesisError::Malformed(format!("unexpected line in '[fg]' section: '{}'", line)));
        }
    }
    Ok((f_colors, g_colors))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partition_file() {
        let text = "inputs: e1 e2\noutputs: a1\n";
        let partition: Partition = text.parse().unwrap();
        assert_eq!(partition.inputs, vec!["e1".to_string(), "e2".to_string()]);
        assert_eq!(partition.outputs, vec!["a1".to_string()]);
    }

    #[test]
    fn rejects_malformed_partition_file() {
        let result: Result<Partition> = "bogus: x\n".parse();
        assert!(result.is_err());
    }

    #[test]
    fn parses_combined_input_file() {
        let text = "\
[dfa]
states: 2
alphabet: a
initial: 0
accepting: 1
transitions:
0 0 0
0 1 1
1 - 1

[formula]
0

[quantifiers]
0 Exists

[colors]
0: 1
";
        let parsed: InputFile = text.parse().unwrap();
        assert_eq!(parsed.table.state_count, 2);
        assert_eq!(parsed.quantifiers, vec![QuantifierKind::Exists]);
        assert_eq!(parsed.color_states, vec![vec![1]]);
        assert!(parsed.f_colors.is_empty());
        assert!(parsed.g_colors.is_empty());
    }

    #[test]
    fn parses_fg_section_when_present() {
        let text = "\
[dfa]
states: 1
alphabet: a
initial: 0
accepting:
transitions:
0 - 0

[formula]
0 & !1

[quantifiers]
0 Exists
1 Exists

[colors]
0: 0
1:

[fg]
f: 0
g: 1
";
        let parsed: InputFile = text.parse().unwrap();
        assert_eq!(parsed.f_colors, vec![0]);
        assert_eq!(parsed.g_colors, vec![1]);
    }
}
