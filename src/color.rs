//! The outer color formula: a positive-Boolean expression over color
//! identifiers, used both as a postfix token stream (consumed by the
//! Zielonka tree builder) and as a BDD over dedicated color variables in a
//! private BDD manager (consumed by the Manna-Pnueli DAG simplification).
//!
//! Grounded in original_source's `ELHelpers.hh`: the tokenizer and
//! infix-to-postfix shunting-yard algorithm there are re-expressed here as a
//! recursive-descent parser building an AST directly (matching the grammar
//! of spec.md §6), from which both a postfix token stream and a BDD can be
//! derived, rather than operating on token strings throughout.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use cudd::{Bdd, Cudd};

use crate::error::{Result, SynthesisError};

/// A color formula: a positive-Boolean expression (`!`, `&`, `|`,
/// parentheses) over color identifiers, per spec.md §6's grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorFormula {
    /// A single color identifier: "color `c` is seen infinitely often".
    Color(usize),
    /// A Boolean constant, produced only by [`ColorFormula::substitute`]
    /// folding a color away.
    Const(bool),
    /// Negation: "color is not seen infinitely often".
    Not(Box<ColorFormula>),
    /// Conjunction.
    And(Box<ColorFormula>, Box<ColorFormula>),
    /// Disjunction.
    Or(Box<ColorFormula>, Box<ColorFormula>),
}

impl ColorFormula {
    /// Evaluates this formula given which colors are currently "in play"
    /// (seen infinitely often): `assignment(c)` is `true` iff color `c` is
    /// in the label being evaluated.
    pub fn evaluate(&self, assignment: &impl Fn(usize) -> bool) -> bool {
        match self {
            ColorFormula::Color(c) => assignment(*c),
            ColorFormula::Const(v) => *v,
            ColorFormula::Not(inner) => !inner.evaluate(assignment),
            ColorFormula::And(lhs, rhs) => lhs.evaluate(assignment) && rhs.evaluate(assignment),
            ColorFormula::Or(lhs, rhs) => lhs.evaluate(assignment) || rhs.evaluate(assignment),
        }
    }

    /// Returns this formula's postfix token stream, in the form consumed by
    /// the Zielonka tree builder (spec.md §4.D).
    pub fn to_postfix(&self) -> Vec<PostfixToken> {
        let mut tokens = Vec::new();
        self.write_postfix(&mut tokens);
        tokens
    }

    fn write_postfix(&self, out: &mut Vec<PostfixToken>) {
        match self {
            ColorFormula::Color(c) => out.push(PostfixToken::Color(*c)),
            ColorFormula::Const(v) => out.push(PostfixToken::Const(*v)),
            ColorFormula::Not(inner) => {
                inner.write_postfix(out);
                out.push(PostfixToken::Not);
            }
            ColorFormula::And(lhs, rhs) => {
                lhs.write_postfix(out);
                rhs.write_postfix(out);
                out.push(PostfixToken::And);
            }
            ColorFormula::Or(lhs, rhs) => {
                lhs.write_postfix(out);
                rhs.write_postfix(out);
                out.push(PostfixToken::Or);
            }
        }
    }

    /// Replaces every occurrence of `color` by the constant `value`,
    /// algebraically simplifying constants away.
    ///
    /// Used by the Manna-Pnueli solver to reduce the outer formula at each
    /// F/G DAG node: a forgiven G-color becomes `true`, a dropped F-color
    /// becomes `false`.
    pub fn substitute(&self, color: usize, value: bool) -> ColorFormula {
        match self {
            ColorFormula::Color(c) if *c == color => ColorFormula::Const(value),
            ColorFormula::Color(c) => ColorFormula::Color(*c),
            ColorFormula::Const(v) => ColorFormula::Const(*v),
            ColorFormula::Not(inner) => negate(inner.substitute(color, value)),
            ColorFormula::And(lhs, rhs) => conjoin(lhs.substitute(color, value), rhs.substitute(color, value)),
            ColorFormula::Or(lhs, rhs) => disjoin(lhs.substitute(color, value), rhs.substitute(color, value)),
        }
    }

    /// Returns the set of distinct color identifiers mentioned in this
    /// formula.
    pub fn colors(&self) -> Vec<usize> {
        let mut colors = Vec::new();
        self.collect_colors(&mut colors);
        colors.sort_unstable();
        colors.dedup();
        colors
    }

    fn collect_colors(&self, out: &mut Vec<usize>) {
        match self {
            ColorFormula::Color(c) => out.push(*c),
            ColorFormula::Const(_) => {}
            ColorFormula::Not(inner) => inner.collect_colors(out),
            ColorFormula::And(lhs, rhs) | ColorFormula::Or(lhs, rhs) => {
                lhs.collect_colors(out);
                rhs.collect_colors(out);
            }
        }
    }

    /// Evaluates this formula over a dedicated BDD manager: one variable per
    /// color, via [`ColorBddContext`].
    pub fn to_bdd(&self, context: &ColorBddContext) -> Bdd {
        match self {
            ColorFormula::Const(true) => context.cudd.bdd_one(),
            ColorFormula::Const(false) => context.cudd.bdd_zero(),
            ColorFormula::Color(c) => context.color_var(*c).clone(),
            ColorFormula::Not(inner) => !inner.to_bdd(context),
            ColorFormula::And(lhs, rhs) => &lhs.to_bdd(context) & &rhs.to_bdd(context),
            ColorFormula::Or(lhs, rhs) => &lhs.to_bdd(context) | &rhs.to_bdd(context),
        }
    }
}

fn negate(formula: ColorFormula) -> ColorFormula {
    match formula {
        ColorFormula::Const(v) => ColorFormula::Const(!v),
        other => ColorFormula::Not(Box::new(other)),
    }
}

fn conjoin(lhs: ColorFormula, rhs: ColorFormula) -> ColorFormula {
    match (lhs, rhs) {
        (ColorFormula::Const(false), _) | (_, ColorFormula::Const(false)) => ColorFormula::Const(false),
        (ColorFormula::Const(true), other) | (other, ColorFormula::Const(true)) => other,
        (lhs, rhs) => ColorFormula::And(Box::new(lhs), Box::new(rhs)),
    }
}

fn disjoin(lhs: ColorFormula, rhs: ColorFormula) -> ColorFormula {
    match (lhs, rhs) {
        (ColorFormula::Const(true), _) | (_, ColorFormula::Const(true)) => ColorFormula::Const(true),
        (ColorFormula::Const(false), other) | (other, ColorFormula::Const(false)) => other,
        (lhs, rhs) => ColorFormula::Or(Box::new(lhs), Box::new(rhs)),
    }
}

impl fmt::Display for ColorFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorFormula::Const(true) => write!(f, "true"),
            ColorFormula::Const(false) => write!(f, "false"),
            ColorFormula::Color(c) => write!(f, "{}", c),
            ColorFormula::Not(inner) => write!(f, "!{}", inner),
            ColorFormula::And(lhs, rhs) => write!(f, "({} & {})", lhs, rhs),
            ColorFormula::Or(lhs, rhs) => write!(f, "({} | {})", lhs, rhs),
        }
    }
}

/// A postfix token of a color formula: either a color leaf or an operator
/// consuming its operands from the top of the evaluation stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostfixToken {
    /// Push the truth value of this color.
    Color(usize),
    /// Push a Boolean constant, produced only for a formula that has had
    /// [`ColorFormula::substitute`] applied.
    Const(bool),
    /// Pop one value, push its negation.
    Not,
    /// Pop two values, push their conjunction.
    And,
    /// Pop two values, push their disjunction.
    Or,
}

/// Evaluates a postfix token stream given which colors are in play, using an
/// explicit stack machine — the representation the Zielonka tree builder
/// evaluates directly at each candidate label, avoiding an AST walk per
/// candidate.
pub fn evaluate_postfix(tokens: &[PostfixToken], assignment: &impl Fn(usize) -> bool) -> bool {
    let mut stack: Vec<bool> = Vec::with_capacity(tokens.len());
    for token in tokens {
        match token {
            PostfixToken::Color(c) => stack.push(assignment(*c)),
            PostfixToken::Const(v) => stack.push(*v),
            PostfixToken::Not => {
                let v = stack.pop().expect("malformed postfix stream");
                stack.push(!v);
            }
            PostfixToken::And => {
                let rhs = stack.pop().expect("malformed postfix stream");
                let lhs = stack.pop().expect("malformed postfix stream");
                stack.push(lhs && rhs);
            }
            PostfixToken::Or => {
                let rhs = stack.pop().expect("malformed postfix stream");
                let lhs = stack.pop().expect("malformed postfix stream");
                stack.push(lhs || rhs);
            }
        }
    }
    assert_eq!(stack.len(), 1, "postfix stream did not reduce to a single value");
    stack[0]
}

impl FromStr for ColorFormula {
    type Err = SynthesisError;

    fn from_str(input: &str) -> Result<Self> {
        let mut parser = Parser::new(input)?;
        let formula = parser.parse_expr()?;
        parser.expect_end()?;
        Ok(formula)
    }
}

/// A recursive-descent parser for the grammar of spec.md §6:
/// `⟨expr⟩ ::= ⟨term⟩ ('|' ⟨term⟩)*`, `⟨term⟩ ::= ⟨factor⟩ ('&' ⟨factor⟩)*`,
/// `⟨factor⟩ ::= '!'⟨factor⟩ | ⟨number⟩ | '(' ⟨expr⟩ ')'`.
struct Parser {
    tokens: Vec<char>,
    position: usize,
}

impl Parser {
    fn new(input: &str) -> Result<Self> {
        let tokens: Vec<char> = input.chars().filter(|c| !c.is_whitespace()).collect();
        Ok(Self { tokens, position: 0 })
    }

    fn peek(&self) -> Option<char> {
        self.tokens.get(self.position).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.position += 1;
        }
        c
    }

    fn expect_end(&self) -> Result<()> {
        if self.position == self.tokens.len() {
            Ok(())
        } else {
            Err(SynthesisError::Malformed(format!(
                "trailing input in color formula at position {}",
                self.position
            )))
        }
    }

    fn parse_expr(&mut self) -> Result<ColorFormula> {
        let mut formula = self.parse_term()?;
        while self.peek() == Some('|') {
            self.advance();
            let rhs = self.parse_term()?;
            formula = ColorFormula::Or(Box::new(formula), Box::new(rhs));
        }
        Ok(formula)
    }

    fn parse_term(&mut self) -> Result<ColorFormula> {
        let mut formula = self.parse_factor()?;
        while self.peek() == Some('&') {
            self.advance();
            let rhs = self.parse_factor()?;
            formula = ColorFormula::And(Box::new(formula), Box::new(rhs));
        }
        Ok(formula)
    }

    fn parse_factor(&mut self) -> Result<ColorFormula> {
        match self.peek() {
            Some('!') => {
                self.advance();
                let inner = self.parse_factor()?;
                Ok(ColorFormula::Not(Box::new(inner)))
            }
            Some('(') => {
                self.advance();
                let inner = self.parse_expr()?;
                match self.advance() {
                    Some(')') => Ok(inner),
                    _ => Err(SynthesisError::Malformed("unmatched '(' in color formula".to_string())),
                }
            }
            Some(c) if c.is_ascii_digit() => {
                let mut digits = String::new();
                while let Some(c) = self.peek() {
                    if c.is_ascii_digit() {
                        digits.push(c);
                        self.advance();
                    } else {
                        break;
                    }
                }
                let color = digits
                    .parse::<usize>()
                    .map_err(|_| SynthesisError::Malformed(format!("invalid color identifier '{}'", digits)))?;
                Ok(ColorFormula::Color(color))
            }
            Some(c) => Err(SynthesisError::Malformed(format!("unexpected character '{}' in color formula", c))),
            None => Err(SynthesisError::Malformed("unexpected end of color formula".to_string())),
        }
    }
}

/// A private BDD manager over one variable per color, used only by the
/// Manna-Pnueli solver to simplify the color formula at each F/G DAG node
/// via BDD equivalence rather than AST-level constant folding.
pub struct ColorBddContext {
    cudd: Cudd,
    vars: Vec<Bdd>,
}

impl ColorBddContext {
    /// Creates a context with one fresh variable per color in
    /// `0..num_colors`.
    pub fn new(num_colors: usize) -> Self {
        let cudd = Cudd::with_vars(num_colors).expect("failed to init color BDD engine");
        let vars = (0..num_colors).map(|i| cudd.bdd_var(i)).collect();
        Self { cudd, vars }
    }

    /// Returns the BDD variable for the given color.
    pub fn color_var(&self, color: usize) -> &Bdd {
        &self.vars[color]
    }

    /// Returns the underlying BDD engine, e.g. for `bdd_one`/`bdd_zero`.
    pub fn engine(&self) -> &Cudd {
        &self.cudd
    }
}

/// A shared handle to a [`ColorBddContext`], matching the non-singleton
/// engine-handle discipline used for the main BDD manager.
pub type SharedColorBddContext = Rc<ColorBddContext>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_grammar_example() {
        let formula: ColorFormula = "0 & !1 | (1 | 2)".parse().unwrap();
        assert!(formula.evaluate(&|c| c == 1));
        assert!(!formula.evaluate(&|_| false));
    }

    #[test]
    fn postfix_matches_ast_evaluation() {
        let formula: ColorFormula = "0 & !1 | (1 | 2)".parse().unwrap();
        let postfix = formula.to_postfix();
        for mask in 0..8u32 {
            let assignment = |c: usize| (mask >> c) & 1 == 1;
            assert_eq!(
                formula.evaluate(&assignment),
                evaluate_postfix(&postfix, &assignment)
            );
        }
    }

    #[test]
    fn substitute_simplifies_constants() {
        let formula: ColorFormula = "0 & 1".parse().unwrap();
        let simplified = formula.substitute(0, false);
        assert_eq!(simplified, ColorFormula::Const(false));
    }

    #[test]
    fn to_bdd_agrees_with_ast_evaluation() {
        let formula: ColorFormula = "0 | !1".parse().unwrap();
        let context = ColorBddContext::new(2);
        let bdd = formula.to_bdd(&context);
        for mask in 0..4u32 {
            let assignment = vec![(mask & 1) == 1, (mask >> 1 & 1) == 1];
            assert_eq!(formula.evaluate(&|c| assignment[c]), bdd.eval(&assignment));
        }
    }

    #[test]
    fn rejects_malformed_input() {
        let result: Result<ColorFormula> = "0 & & 1".parse();
        assert!(result.is_err());
    }
}
