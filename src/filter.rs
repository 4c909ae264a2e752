//! Account exclusion policy
//!
//! Test and demo accounts are identified by naming convention and removed
//! from every aggregate. The same policy renders to SQL (as a correlated
//! `NOT EXISTS` with bound LIKE patterns) and evaluates in memory.

use crate::types::Account;

/// An account is excluded when
/// `(group LIKE test OR name LIKE test) AND (group LIKE kcm OR group LIKE test_kcm)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionPolicy {
    pub test_pattern: String,
    pub kcm_pattern: String,
    pub test_kcm_pattern: String,
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        Self {
            test_pattern: "%test%".to_string(),
            kcm_pattern: "KCM%".to_string(),
            test_kcm_pattern: "testKCM%".to_string(),
        }
    }
}

impl ExclusionPolicy {
    pub fn excludes(&self, account: &Account) -> bool {
        let is_test = like(&self.test_pattern, &account.group) || like(&self.test_pattern, &account.name);
        let is_kcm = like(&self.kcm_pattern, &account.group) || like(&self.test_kcm_pattern, &account.group);
        is_test && is_kcm
    }

    /// `NOT EXISTS` clause correlated on `trade_alias.login`. Binds four
    /// parameters, in the order returned by [`Self::params`].
    pub fn not_exists_sql(&self, schema: &str, trade_alias: &str) -> String {
        format!(
            "NOT EXISTS (\
             SELECT 1 FROM {schema}.mt4_users u \
             WHERE u.LOGIN = {trade_alias}.login \
             AND (u.`GROUP` LIKE ? OR u.name LIKE ?) \
             AND (u.`GROUP` LIKE ? OR u.`GROUP` LIKE ?))"
        )
    }

    pub fn params(&self) -> [&str; 4] {
        [
            &self.test_pattern,
            &self.test_pattern,
            &self.kcm_pattern,
            &self.test_kcm_pattern,
        ]
    }
}

/// SQL `LIKE` with `%` and `_` wildcards, ASCII case-insensitive like the
/// ledger's default collation. `\` escapes the next character.
pub fn like(pattern: &str, value: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let value: Vec<char> = value.chars().collect();
    like_from(&pattern, &value)
}

fn like_from(pattern: &[char], value: &[char]) -> bool {
    match pattern.split_first() {
        None => value.is_empty(),
        Some(('%', rest)) => (0..=value.len()).any(|skip| like_from(rest, &value[skip..])),
        Some(('_', rest)) => !value.is_empty() && like_from(rest, &value[1..]),
        Some(('\\', rest)) if !rest.is_empty() => {
            !value.is_empty() && value[0] == rest[0] && like_from(&rest[1..], &value[1..])
        }
        Some((c, rest)) => match value.split_first() {
            Some((v, tail)) => c.eq_ignore_ascii_case(v) && like_from(rest, tail),
            None => false,
        },
    }
}
