//! Control-flow statements of service function bodies.
//!
//! This is a minimal structured sublanguage rather than a general expression
//! language: conditions and collection expressions are kept as opaque text
//! and passed through to generators untouched.

/// A statement inside a service function body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `if <condition> { ... } else { ... }`
    If {
        condition: String,
        then_branch: Vec<Statement>,
        else_branch: Vec<Statement>,
    },
    /// `for <item> in <collection> { ... }`
    ForEach {
        item: String,
        collection: String,
        body: Vec<Statement>,
    },
    /// `transaction { ... }`
    Transaction { body: Vec<Statement> },
}

impl Statement {
    /// Returns the statements nested directly inside this one, in source order.
    pub fn children(&self) -> impl Iterator<Item = &Statement> {
        let (first, second) = match self {
            Statement::If {
                then_branch,
                else_branch,
                ..
            } => (then_branch.as_slice(), else_branch.as_slice()),
            Statement::ForEach { body, .. } | Statement::Transaction { body } => {
                (body.as_slice(), &[] as &[Statement])
            }
        };
        first.iter().chain(second.iter())
    }

    /// Returns the nesting depth of this statement; a statement with no
    /// children has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children().map(Statement::depth).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transaction(body: Vec<Statement>) -> Statement {
        Statement::Transaction { body }
    }

    #[test]
    fn test_children_of_if_include_both_branches() {
        let statement = Statement::If {
            condition: "a".to_string(),
            then_branch: vec![transaction(vec![])],
            else_branch: vec![transaction(vec![]), transaction(vec![])],
        };

        assert_eq!(statement.children().count(), 3);
    }

    #[test]
    fn test_depth() {
        let leaf = transaction(vec![]);
        assert_eq!(leaf.depth(), 1);

        let nested = Statement::ForEach {
            item: "person".to_string(),
            collection: "people".to_string(),
            body: vec![transaction(vec![transaction(vec![])])],
        };
        assert_eq!(nested.depth(), 3);
    }
}
