//! Generation profiles for sysy-stress.
//!
//! A profile bundles the statement mix and the expression shape. Built-in
//! profiles are TOML files embedded in the binary; a path to a user TOML file
//! works too. Fields omitted from a TOML file keep the `default` profile
//! values (the `Default` impls on each config struct).

use thiserror::Error;

use crate::expr::ExprConfig;
use crate::program::ProgramConfig;

/// A generation profile combining program and expression configuration.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Profile {
    pub program: ProgramConfig,
    pub expr: ExprConfig,
}

/// Failure to resolve a profile name or file.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("unknown profile '{0}', available profiles: {list}", list = available_profiles().join(", "))]
    Unknown(String),
    #[error("failed to read profile file '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse profile '{name}': {message}")]
    Parse { name: String, message: String },
    #[error("invalid profile '{name}': {message}")]
    Invalid { name: String, message: String },
}

static PROFILES: &[(&str, &str)] = &[
    ("default", include_str!("../profiles/default.toml")),
    ("minimal", include_str!("../profiles/minimal.toml")),
    ("expr-heavy", include_str!("../profiles/expr-heavy.toml")),
];

/// Names of the built-in profiles.
pub fn available_profiles() -> Vec<&'static str> {
    PROFILES.iter().map(|(name, _)| *name).collect()
}

/// Get a built-in profile by name, or load one from a file path.
///
/// Anything containing `/` or ending in `.toml` is treated as a path.
pub fn get_profile(name_or_path: &str) -> Result<Profile, ProfileError> {
    let text = if name_or_path.contains('/') || name_or_path.ends_with(".toml") {
        std::fs::read_to_string(name_or_path).map_err(|source| ProfileError::Read {
            path: name_or_path.to_string(),
            source,
        })?
    } else {
        PROFILES
            .iter()
            .find(|(name, _)| *name == name_or_path)
            .map(|(_, text)| text.to_string())
            .ok_or_else(|| ProfileError::Unknown(name_or_path.to_string()))?
    };

    let profile: Profile = toml::from_str(&text).map_err(|e| ProfileError::Parse {
        name: name_or_path.to_string(),
        message: e.to_string(),
    })?;
    profile.validate().map_err(|message| ProfileError::Invalid {
        name: name_or_path.to_string(),
        message,
    })?;
    Ok(profile)
}

impl Profile {
    /// Reject ranges and probabilities the generator cannot sample from.
    pub fn validate(&self) -> Result<(), String> {
        let p = &self.program;
        let e = &self.expr;

        check_range("program.const_decls", p.const_decls)?;
        check_range("program.statements", p.statements)?;
        check_range("program.array_size", p.array_size)?;
        if p.array_size.0 == 0 {
            return Err("program.array_size must start at 1".to_string());
        }
        check_range("expr.depth", e.depth)?;
        check_range("expr.init_depth", e.init_depth)?;
        check_range("expr.literal_range", e.literal_range)?;

        for (field, value) in [
            ("program.initializer_probability", p.initializer_probability),
            ("program.array_decl_probability", p.array_decl_probability),
            ("program.scalar_decl_probability", p.scalar_decl_probability),
            ("program.scalar_assign_probability", p.scalar_assign_probability),
            ("program.print_probability", p.print_probability),
            ("expr.leaf_array_probability", e.leaf_array_probability),
            ("expr.leaf_scalar_probability", e.leaf_scalar_probability),
            ("expr.unary_probability", e.unary_probability),
            ("expr.paren_probability", e.paren_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{field} must be within [0, 1], got {value}"));
            }
        }

        let mix = p.array_decl_probability
            + p.scalar_decl_probability
            + p.scalar_assign_probability
            + p.print_probability;
        if mix > 1.0 + 1e-9 {
            return Err(format!("statement probabilities sum to {mix}, more than 1"));
        }
        Ok(())
    }
}

fn check_range<T: PartialOrd + std::fmt::Display>(field: &str, (lo, hi): (T, T)) -> Result<(), String> {
    if lo > hi {
        return Err(format!("{field} is empty: [{lo}, {hi}]"));
    }
    Ok(())
}
