//! Declaration grammar: `<permission>_<by|as>_<target>`.
//!
//! `<target>` is `anyone`, `self`, a role name, or a relation path joined by
//! `_of_` whose final segment carries the `my_` marker:
//!
//! | declaration                               | target                              |
//! |-------------------------------------------|-------------------------------------|
//! | `readable_by_anyone`                      | `Anyone`                            |
//! | `updatable_by_self`                       | `Itself`                            |
//! | `crudable_by_admin`                       | `Role("admin")`                     |
//! | `destroyable_by_my_owner`                 | `Grant([owner])`                    |
//! | `updatable_by_updaters_of_my_notebook`    | `Grant([notebook, updaters])`       |
//! | `readable_as_my_notebook`                 | `Delegate([notebook])`              |
//! | `crudable_as_notebook_of_my_page`         | `Delegate([page, notebook])`        |
//!
//! For `as` rules the marker is optional, so `readable_as_notebook` is the
//! same rule as `readable_as_my_notebook`.

use std::sync::Arc;

use crate::action::Permission;
use crate::chain::RelationChain;
use crate::error::ConfigurationError;
use crate::rules::{Guard, GuardPredicate, Rule, RuleOptions, RuleTarget};

const SEPARATOR: &str = "_of_";
const MARKER: &str = "my_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Preposition {
    By,
    As,
}

/// Compiles one declaration into a rule per implied action.
///
/// # Errors
///
/// [`ConfigurationError::Malformed`] when the declaration does not follow the
/// grammar or `check` is set on a rule that does not delegate, and
/// [`ConfigurationError::InvalidGuard`] when more than one guard is set or a
/// named guard is not an identifier.
pub fn compile(declaration: &str, options: RuleOptions) -> Result<Vec<Rule>, ConfigurationError> {
    let (permission, preposition, suffix) = split_declaration(declaration)?;
    let mut target = parse_target(declaration, preposition, suffix)?;

    if let Some(check) = options.check {
        match &mut target {
            RuleTarget::Delegate { action, .. } => *action = Some(check),
            _ => {
                return Err(ConfigurationError::malformed(
                    declaration,
                    "`check` only applies to rules that delegate to a relation (`as`)",
                ));
            }
        }
    }

    let mut guards = options.guards;
    if guards.len() > 1 {
        return Err(ConfigurationError::invalid_guard(
            declaration,
            "exactly one of `if` / `unless` may be set",
        ));
    }
    let guard = guards.pop();
    if let Some(GuardPredicate::Named(name)) = guard.as_ref().map(Guard::predicate)
        && !is_identifier(name)
    {
        return Err(ConfigurationError::invalid_guard(
            declaration,
            format!("'{name}' is not a predicate name"),
        ));
    }

    let declaration: Arc<str> = Arc::from(declaration);
    Ok(permission
        .actions()
        .iter()
        .map(|&action| Rule {
            action,
            target: target.clone(),
            guard: guard.clone(),
            declaration: Arc::clone(&declaration),
        })
        .collect())
}

fn split_declaration(
    declaration: &str,
) -> Result<(Permission, Preposition, &str), ConfigurationError> {
    let shape = "expected <permission>_<by|as>_<target>";
    let (keyword, rest) = declaration
        .split_once('_')
        .ok_or_else(|| ConfigurationError::malformed(declaration, shape))?;
    let permission = Permission::from_keyword(keyword).ok_or_else(|| {
        ConfigurationError::malformed(declaration, format!("unknown permission '{keyword}'"))
    })?;
    let (preposition, suffix) = rest
        .split_once('_')
        .ok_or_else(|| ConfigurationError::malformed(declaration, shape))?;
    let preposition = match preposition {
        "by" => Preposition::By,
        "as" => Preposition::As,
        other => {
            return Err(ConfigurationError::malformed(
                declaration,
                format!("expected `by` or `as`, found '{other}'"),
            ));
        }
    };
    if suffix.is_empty() {
        return Err(ConfigurationError::malformed(declaration, "missing target"));
    }
    Ok((permission, preposition, suffix))
}

fn parse_target(
    declaration: &str,
    preposition: Preposition,
    suffix: &str,
) -> Result<RuleTarget, ConfigurationError> {
    let segments: Vec<&str> = suffix.split(SEPARATOR).collect();
    let Some((terminal, outer)) = segments.split_last() else {
        return Err(ConfigurationError::malformed(declaration, "missing target"));
    };

    if let Some(marked) = outer.iter().find(|segment| segment.starts_with(MARKER)) {
        return Err(ConfigurationError::malformed(
            declaration,
            format!("only the final segment may carry `{MARKER}`, found '{marked}'"),
        ));
    }

    let (terminal, marked) = match terminal.strip_prefix(MARKER) {
        Some(relation) => (relation, true),
        None => (*terminal, false),
    };
    for segment in outer.iter().copied().chain(std::iter::once(terminal)) {
        if !is_identifier(segment) {
            return Err(ConfigurationError::malformed(
                declaration,
                format!("'{segment}' is not a relation or role name"),
            ));
        }
    }

    if !marked && outer.is_empty() {
        match terminal {
            "anyone" => return Ok(RuleTarget::Anyone),
            "self" => return Ok(RuleTarget::Itself),
            role if preposition == Preposition::By => return Ok(RuleTarget::Role(role.to_owned())),
            _ => {}
        }
    }
    if !marked && preposition == Preposition::By {
        return Err(ConfigurationError::malformed(
            declaration,
            format!("relation path needs a `{MARKER}` marker on its final segment"),
        ));
    }

    // Resolution starts at the marked segment and walks outward.
    let path = outer.iter().rev().copied();
    let chain = RelationChain::new(std::iter::once(terminal).chain(path));
    Ok(match preposition {
        Preposition::By => RuleTarget::Grant(chain),
        Preposition::As => RuleTarget::Delegate {
            chain,
            action: None,
        },
    })
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('_')
        && !name.ends_with('_')
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}
