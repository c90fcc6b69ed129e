use anyhow::{bail, Result};
use serde::Deserialize;
use serde_json::{json, Value};

use super::Tool;

/// Characters that survive input sanitizing.
const ALLOWED_CHARS: &str = "0123456789+-*/.() \t";

/// Deepest run of parentheses and unary signs the parser accepts.
const MAX_DEPTH: usize = 256;

/// Evaluates basic arithmetic expressions.
pub struct MathSolverTool;

#[derive(Deserialize)]
struct MathInput {
    expression: String,
}

#[async_trait::async_trait]
impl Tool for MathSolverTool {
    fn name(&self) -> &str {
        "math_solver"
    }

    fn description(&self) -> &str {
        "Solve basic math operations"
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "The math expression to evaluate (supports +, -, *, /)"
                }
            },
            "required": ["expression"]
        })
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let input: MathInput = serde_json::from_value(input)?;
        let value = evaluate(&sanitize(&input.expression))?;
        Ok(format_number(value))
    }
}

/// Strips everything outside the arithmetic character set.
fn sanitize(expression: &str) -> String {
    expression
        .chars()
        .filter(|c| ALLOWED_CHARS.contains(*c))
        .collect()
}

/// Parses and evaluates a sanitized expression.
pub fn evaluate(expression: &str) -> Result<f64> {
    let mut parser = Parser {
        chars: expression.chars().filter(|c| !c.is_whitespace()).collect(),
        pos: 0,
        depth: 0,
    };
    if parser.chars.is_empty() {
        bail!("Empty expression");
    }
    let value = parser.expr()?;
    if let Some(c) = parser.peek() {
        bail!("Unexpected '{}' at position {}", c, parser.pos);
    }
    Ok(value)
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Recursive-descent parser over the grammar:
///
/// ```text
/// expr   := term (('+' | '-') term)*
/// term   := factor (('*' | '/') factor)*
/// factor := ('+' | '-') factor | number | '(' expr ')'
/// ```
struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn expr(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        while let Some(op @ ('+' | '-')) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            if op == '+' {
                value += rhs;
            } else {
                value -= rhs;
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64> {
        let mut value = self.factor()?;
        while let Some(op @ ('*' | '/')) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            if op == '*' {
                value *= rhs;
            } else {
                if rhs == 0.0 {
                    bail!("Division by zero");
                }
                value /= rhs;
            }
        }
        Ok(value)
    }

    /// Runs `f` one nesting level deeper.
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_DEPTH {
            bail!("Expression nested too deeply");
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn factor(&mut self) -> Result<f64> {
        match self.bump() {
            Some('-') => self.nested(|p| Ok(-p.factor()?)),
            Some('+') => self.nested(Self::factor),
            Some('(') => self.nested(|p| {
                let value = p.expr()?;
                match p.bump() {
                    Some(')') => Ok(value),
                    _ => bail!("Missing closing parenthesis"),
                }
            }),
            Some(c) if c.is_ascii_digit() || c == '.' => {
                let start = self.pos - 1;
                while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
                    self.pos += 1;
                }
                let literal: String = self.chars[start..self.pos].iter().collect();
                literal
                    .parse::<f64>()
                    .map_err(|_| anyhow::anyhow!("Invalid number '{}'", literal))
            }
            Some(c) => bail!("Unexpected '{}' at position {}", c, self.pos - 1),
            None => bail!("Unexpected end of expression"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_and_parentheses() {
        assert_eq!(evaluate("2+3*4").unwrap(), 14.0);
        assert_eq!(evaluate("(2+3)*4").unwrap(), 20.0);
        assert_eq!(evaluate("10/4").unwrap(), 2.5);
        assert_eq!(evaluate("-3 - -2").unwrap(), -1.0);
        assert_eq!(evaluate("8 - 2 - 1").unwrap(), 5.0);
    }

    #[test]
    fn test_malformed_expressions() {
        assert!(evaluate("").is_err());
        assert!(evaluate("2+").is_err());
        assert!(evaluate("(1+2").is_err());
        assert!(evaluate("1..2").is_err());
        assert!(evaluate("4/0").is_err());
        assert!(evaluate("2*)").is_err());
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let deep = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        let err = evaluate(&deep).unwrap_err();
        assert_eq!(err.to_string(), "Expression nested too deeply");

        let unbalanced = "(".repeat(100_000);
        assert!(evaluate(&unbalanced).is_err());
        assert!(evaluate(&format!("{}1", "-".repeat(100_000))).is_err());

        let ok = format!("{}7{}", "(".repeat(100), ")".repeat(100));
        assert_eq!(evaluate(&ok).unwrap(), 7.0);
        assert_eq!(evaluate("--+-2").unwrap(), -2.0);
    }

    #[tokio::test]
    async fn test_deep_nesting_reported_as_tool_error() {
        let expression = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        let err = MathSolverTool
            .execute(json!({ "expression": expression }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("nested too deeply"));
    }

    #[test]
    fn test_sanitize_strips_foreign_characters() {
        assert_eq!(sanitize("2+2; process.exit()"), "2+2 .()");
        assert_eq!(sanitize("abc"), "");
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(2.5), "2.5");
    }
}
