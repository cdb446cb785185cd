// Named placeholder expansion: `@name` -> positional `?`
//
// sqlx-sqlite only binds positional parameters, so statements written with
// `@name` placeholders are rewritten before preparation. Names may repeat;
// each occurrence becomes its own positional argument.

use mtxn_core::domain::Binding;
use mtxn_core::error::{AppError, Result};

/// Statement text ready for the driver plus its arguments in bind order
#[derive(Debug)]
pub(crate) struct ExpandedStatement<'b> {
    pub sql: String,
    pub args: Vec<&'b Binding>,
}

impl ExpandedStatement<'_> {
    pub fn verbatim(sql: &str) -> Self {
        Self {
            sql: sql.to_string(),
            args: Vec::new(),
        }
    }
}

pub(crate) fn expand_named_placeholders<'b>(
    sql: &str,
    bindings: &'b [Binding],
) -> Result<ExpandedStatement<'b>> {
    ensure_unique_names(bindings)?;

    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    let mut args = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        let end = match (c, next) {
            ('\'', _) | ('"', _) => skip_quoted(&chars, i, c),
            ('[', _) => skip_until(&chars, i + 1, "]"),
            ('-', Some('-')) => skip_until(&chars, i + 2, "\n"),
            ('/', Some('*')) => skip_until(&chars, i + 2, "*/"),
            // @@ROWCOUNT and friends are server variables, not parameters
            ('@', Some('@')) => i + 2,
            ('@', Some(start)) if is_ident_start(start) => {
                let mut end = i + 1;
                while end < chars.len() && is_ident(chars[end]) {
                    end += 1;
                }
                let name: String = chars[i + 1..end].iter().collect();
                let binding = bindings
                    .iter()
                    .find(|b| b.name.eq_ignore_ascii_case(&name))
                    .ok_or_else(|| {
                        AppError::Validation(format!("no binding supplied for parameter @{}", name))
                    })?;

                out.push('?');
                args.push(binding);
                i = end;
                continue;
            }
            _ => i + 1,
        };

        out.extend(&chars[i..end]);
        i = end;
    }

    Ok(ExpandedStatement { sql: out, args })
}

fn ensure_unique_names(bindings: &[Binding]) -> Result<()> {
    for (index, binding) in bindings.iter().enumerate() {
        if bindings[..index]
            .iter()
            .any(|earlier| earlier.name.eq_ignore_ascii_case(&binding.name))
        {
            return Err(AppError::Validation(format!(
                "parameter @{} is bound more than once",
                binding.name
            )));
        }
    }
    Ok(())
}

// End index (exclusive) of a quoted run starting at `start`; doubled quotes escape.
fn skip_quoted(chars: &[char], start: usize, quote: char) -> usize {
    let mut j = start + 1;
    while j < chars.len() {
        if chars[j] == quote {
            if chars.get(j + 1) == Some(&quote) {
                j += 2;
                continue;
            }
            return j + 1;
        }
        j += 1;
    }
    chars.len()
}

// End index (exclusive) just past `terminator`, or the end of input.
fn skip_until(chars: &[char], from: usize, terminator: &str) -> usize {
    let term: Vec<char> = terminator.chars().collect();
    let mut j = from;
    while j + term.len() <= chars.len() {
        if chars[j..j + term.len()] == term[..] {
            return j + term.len();
        }
        j += 1;
    }
    chars.len()
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
