use unicode_normalization::UnicodeNormalization;

use crate::bot::commands::{commands::{ArgType, ArgValue, ArgumentSpec}, types::TypeResolvers};

/// Why argument filling stopped. Positions are zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    Missing { position: usize },
    Mismatch { position: usize, token: String },
}

/// First accepted type that parses the token wins.
pub fn coerce(token: &str, accepted: &[ArgType], types: &TypeResolvers) -> Option<ArgValue> {
    accepted.iter().find_map(|ty| match ty {
        ArgType::Text => Some(ArgValue::Text(token.to_string())),
        ArgType::Number => parse_number(token).map(ArgValue::Number),
        ArgType::Boolean => parse_bool(token).map(ArgValue::Boolean),
        ArgType::Extended(name) => types.resolve(name, token),
    })
}

fn parse_number(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_bool(token: &str) -> Option<bool> {
    let normalized: String = token.nfkc().collect::<String>().to_lowercase();
    match normalized.as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Binds `rest` against the declared specs. With no specs every token is
/// passed through as text.
pub fn fill_arguments(specs: &[ArgumentSpec], rest: &[String], types: &TypeResolvers) -> Result<Vec<ArgValue>, ArgumentError> {
    if specs.is_empty() {
        return Ok(rest.iter().map(|t| ArgValue::Text(t.clone())).collect());
    }

    let mut bound = Vec::with_capacity(specs.len());
    for (position, spec) in specs.iter().enumerate() {
        if spec.is_variadic {
            let tail = rest.get(position..).unwrap_or_default();
            let mut items = Vec::with_capacity(tail.len());
            for token in tail {
                let value = coerce(token, &spec.accepted_types, types)
                    .ok_or_else(|| ArgumentError::Mismatch { position, token: token.clone() })?;
                items.push(value);
            }
            bound.push(ArgValue::Sequence(items));
            break;
        }

        match rest.get(position) {
            Some(token) => {
                let value = coerce(token, &spec.accepted_types, types)
                    .ok_or_else(|| ArgumentError::Mismatch { position, token: token.clone() })?;
                bound.push(value);
            }
            None => match &spec.default {
                Some(default) => bound.push(default.clone()),
                None => return Err(ArgumentError::Missing { position }),
            },
        }
    }

    Ok(bound)
}
