use std::fmt;

use super::model::Model;

/// What a service handle currently points at.
///
/// Every successful service call produces a new handle holding the call's
/// result as its objects.
#[derive(Debug, Clone, PartialEq)]
pub enum Objects<M> {
    /// Every stored row; nothing has been queried yet
    Manager,
    /// The rows a query returned
    Set(Vec<M>),
    /// A single row
    Instance(M),
    /// The result of a count
    Count(usize),
    /// Nothing, e.g. after a delete or a `first()` on no rows
    Empty,
}

impl<M> Objects<M> {
    /// The single row, if the objects are an instance.
    pub fn instance(&self) -> Option<&M> {
        match self {
            Objects::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// The rows, if the objects are a query result.
    pub fn set(&self) -> Option<&[M]> {
        match self {
            Objects::Set(rows) => Some(rows),
            _ => None,
        }
    }

    /// The count, if the objects are a count.
    pub fn count(&self) -> Option<usize> {
        match self {
            Objects::Count(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns `true` for [`Objects::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Objects::Empty)
    }

    /// Takes the single row out.
    pub fn into_instance(self) -> Option<M> {
        match self {
            Objects::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// Number of rows held: 1 for an instance, 0 for a manager, count or
    /// nothing.
    pub fn len(&self) -> usize {
        match self {
            Objects::Set(rows) => rows.len(),
            Objects::Instance(_) => 1,
            Objects::Manager | Objects::Count(_) | Objects::Empty => 0,
        }
    }

    /// Takes the rows out. An instance becomes a one-row vector.
    pub fn into_vec(self) -> Vec<M> {
        match self {
            Objects::Set(rows) => rows,
            Objects::Instance(instance) => vec![instance],
            Objects::Manager | Objects::Count(_) | Objects::Empty => Vec::new(),
        }
    }
}

impl<M> From<Option<M>> for Objects<M> {
    fn from(instance: Option<M>) -> Self {
        instance.map_or(Objects::Empty, Objects::Instance)
    }
}

impl<M> From<Vec<M>> for Objects<M> {
    fn from(rows: Vec<M>) -> Self {
        Objects::Set(rows)
    }
}

impl<M: Model> fmt::Display for Objects<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Objects::Manager => write!(f, "<Manager: {}>", M::NAME),
            Objects::Set(rows) => {
                f.write_str("<QuerySet [")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "<{}: {}>", M::NAME, row.describe())?;
                }
                f.write_str("]>")
            }
            Objects::Instance(instance) => f.write_str(&instance.describe()),
            Objects::Count(n) => write!(f, "{n}"),
            Objects::Empty => f.write_str("None"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::model::tests::{article, Article};

    #[test]
    fn display_forms() {
        let mut a = article("a", 0);
        a.id = Some(1);
        let mut b = article("b", 0);
        b.id = Some(2);

        assert_eq!(Objects::<Article>::Manager.to_string(), "<Manager: Article>");
        assert_eq!(
            Objects::Set(vec![a.clone(), b]).to_string(),
            "<QuerySet [<Article: Article object (1)>, <Article: Article object (2)>]>"
        );
        assert_eq!(Objects::Instance(a).to_string(), "Article object (1)");
        assert_eq!(Objects::<Article>::Count(4).to_string(), "4");
        assert_eq!(Objects::<Article>::Empty.to_string(), "None");
    }

    #[test]
    fn conversions() {
        assert!(Objects::<Article>::from(None).is_empty());
        let objects: Objects<Article> = vec![article("a", 0)].into();
        assert_eq!(objects.set().map(<[Article]>::len), Some(1));
        assert_eq!(objects.into_vec().len(), 1);
    }
}
