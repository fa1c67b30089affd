//! Statement classification
//!
//! Lexical, best-effort labelling of each statement in a query string by its
//! leading keyword. The label is attached to the result only; it never
//! changes how a query is executed.

use sqlparser::dialect::GenericDialect;
use sqlparser::keywords::Keyword;
use sqlparser::tokenizer::{Token, Tokenizer};

/// Kind of a SQL statement, by leading keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Truncate,
    Create,
    Drop,
    Alter,
}

impl StatementKind {
    /// Label used as the result's `command`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Truncate => "TRUNCATE",
            Self::Create => "CREATE",
            Self::Drop => "DROP",
            Self::Alter => "ALTER",
        }
    }

    /// Whether the statement reads rows (and so reports a row count)
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Select)
    }

    fn from_keyword(keyword: Keyword) -> Option<Self> {
        match keyword {
            Keyword::SELECT | Keyword::WITH => Some(Self::Select),
            Keyword::INSERT => Some(Self::Insert),
            Keyword::UPDATE => Some(Self::Update),
            Keyword::DELETE => Some(Self::Delete),
            Keyword::TRUNCATE => Some(Self::Truncate),
            Keyword::CREATE => Some(Self::Create),
            Keyword::DROP => Some(Self::Drop),
            Keyword::ALTER => Some(Self::Alter),
            _ => None,
        }
    }
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a query string could not be classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    /// The tokenizer rejected the input (e.g., unterminated string)
    Tokenize(String),
    /// A statement starts with a keyword that is not recognized
    UnknownStatement(String),
}

/// Classify every statement in `sql`, in order
///
/// Strict: any unrecognized statement fails the whole string. Use
/// [`identify_commands`] for the fail-open variant.
pub fn classify(sql: &str) -> Result<Vec<StatementKind>, ClassifyError> {
    let dialect = GenericDialect {};
    let tokens = Tokenizer::new(&dialect, sql)
        .tokenize()
        .map_err(|e| ClassifyError::Tokenize(e.to_string()))?;

    let mut kinds = Vec::new();
    let mut at_statement_start = true;
    for token in tokens {
        match token {
            Token::Whitespace(_) => {}
            Token::SemiColon => at_statement_start = true,
            // `(SELECT ...)` is still a select
            Token::LParen if at_statement_start => {}
            _ if !at_statement_start => {}
            Token::Word(word) => {
                let kind = StatementKind::from_keyword(word.keyword)
                    .ok_or_else(|| ClassifyError::UnknownStatement(word.value.clone()))?;
                kinds.push(kind);
                at_statement_start = false;
            }
            other => return Err(ClassifyError::UnknownStatement(other.to_string())),
        }
    }

    Ok(kinds)
}

/// Fail-open classification: an empty list when the input can't be classified
pub fn identify_commands(sql: &str) -> Vec<StatementKind> {
    match classify(sql) {
        Ok(kinds) => kinds,
        Err(e) => {
            tracing::debug!(error = ?e, "could not classify statement");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_select() {
        assert_eq!(classify("SELECT * FROM records").unwrap(), vec![StatementKind::Select]);
        assert_eq!(classify("  select 1").unwrap(), vec![StatementKind::Select]);
    }

    #[test]
    fn test_classify_with_is_select() {
        assert_eq!(
            classify("WITH x AS (SELECT 1) SELECT * FROM x").unwrap(),
            vec![StatementKind::Select]
        );
    }

    #[test]
    fn test_classify_parenthesized_select() {
        assert_eq!(classify("(SELECT 1)").unwrap(), vec![StatementKind::Select]);
    }

    #[test]
    fn test_classify_skips_comments() {
        let sql = "-- recent signups\n/* block */ SELECT person FROM records";
        assert_eq!(classify(sql).unwrap(), vec![StatementKind::Select]);
    }

    #[test]
    fn test_classify_multiple_statements() {
        assert_eq!(
            classify("SELECT 1; DELETE FROM records;").unwrap(),
            vec![StatementKind::Select, StatementKind::Delete]
        );
    }

    #[test]
    fn test_classify_ignores_keywords_mid_statement() {
        assert_eq!(
            classify("SELECT * FROM records WHERE event IN (SELECT 1)").unwrap(),
            vec![StatementKind::Select]
        );
    }

    #[test]
    fn test_classify_write_statements() {
        assert_eq!(classify("INSERT INTO t VALUES (1)").unwrap(), vec![StatementKind::Insert]);
        assert_eq!(classify("update t set a = 1").unwrap(), vec![StatementKind::Update]);
        assert_eq!(classify("TRUNCATE TABLE t").unwrap(), vec![StatementKind::Truncate]);
        assert_eq!(classify("DROP TABLE t").unwrap(), vec![StatementKind::Drop]);
    }

    #[test]
    fn test_classify_unknown_keyword() {
        assert!(matches!(
            classify("FROBNICATE records"),
            Err(ClassifyError::UnknownStatement(_))
        ));
    }

    #[test]
    fn test_classify_unterminated_string() {
        assert!(matches!(
            classify("SELECT 'oops"),
            Err(ClassifyError::Tokenize(_))
        ));
    }

    #[test]
    fn test_classify_empty() {
        assert!(classify("").unwrap().is_empty());
        assert!(classify("  ;  ").unwrap().is_empty());
    }

    #[test]
    fn test_identify_commands_fails_open() {
        assert!(identify_commands("FROBNICATE records").is_empty());
        assert!(identify_commands("SELECT 'oops").is_empty());
        assert_eq!(identify_commands("SELECT 1"), vec![StatementKind::Select]);
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(StatementKind::Select.to_string(), "SELECT");
        assert!(StatementKind::Select.is_read());
        assert!(!StatementKind::Delete.is_read());
    }
}
