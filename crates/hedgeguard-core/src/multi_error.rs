//! An ordered collection of errors that is itself an error.
//!
//! The hedger collects one error per failed attempt here and hands the whole
//! collection back when every attempt failed.
//!
//! ```rust
//! use hedgeguard_core::MultiError;
//!
//! let mut errs: MultiError<String> = MultiError::new();
//! assert!(errs.clone().error_or_none().is_none());
//!
//! errs.push("connection reset".to_string());
//! errs.push("timed out".to_string());
//! assert_eq!(
//!     errs.to_string(),
//!     "2 errors occurred:\n\t* connection reset\n\t* timed out\n\n"
//! );
//! ```

use std::fmt;
use std::sync::Arc;

/// Renders a slice of errors into a summary string.
pub type ErrorFormatter<E> = Arc<dyn Fn(&[E]) -> String + Send + Sync>;

/// Accumulates errors in the order they were observed.
pub struct MultiError<E> {
    errors: Vec<E>,
    formatter: Option<ErrorFormatter<E>>,
}

impl<E> MultiError<E> {
    /// An empty collection using the default list rendering.
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            formatter: None,
        }
    }

    /// An empty collection with room for `capacity` errors.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            errors: Vec::with_capacity(capacity),
            formatter: None,
        }
    }

    /// Replaces the rendering used by `Display`.
    pub fn with_formatter<F>(mut self, f: F) -> Self
    where
        F: Fn(&[E]) -> String + Send + Sync + 'static,
    {
        self.formatter = Some(Arc::new(f));
        self
    }

    /// Appends an error.
    pub fn push(&mut self, err: E) {
        self.errors.push(err);
    }

    /// Number of collected errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// True when nothing has been collected.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// The collected errors, oldest first.
    pub fn errors(&self) -> &[E] {
        &self.errors
    }

    /// Consumes the collection, returning the errors oldest first.
    pub fn into_errors(self) -> Vec<E> {
        self.errors
    }

    /// `None` when empty, the collection itself otherwise.
    pub fn error_or_none(self) -> Option<Self> {
        if self.errors.is_empty() {
            None
        } else {
            Some(self)
        }
    }

    /// `Ok(())` when empty, `Err(self)` otherwise.
    pub fn into_result(self) -> Result<(), Self> {
        match self.error_or_none() {
            Some(errs) => Err(errs),
            None => Ok(()),
        }
    }
}

fn render_list<E: fmt::Display>(errors: &[E]) -> String {
    if errors.len() == 1 {
        return format!("1 error occurred:\n\t* {}\n\n", errors[0]);
    }

    let points: Vec<String> = errors.iter().map(|e| format!("* {}", e)).collect();
    format!(
        "{} errors occurred:\n\t{}\n\n",
        errors.len(),
        points.join("\n\t")
    )
}

impl<E> Default for MultiError<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> Clone for MultiError<E> {
    fn clone(&self) -> Self {
        Self {
            errors: self.errors.clone(),
            formatter: self.formatter.clone(),
        }
    }
}

impl<E: fmt::Display> fmt::Display for MultiError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.formatter {
            Some(render) => f.write_str(&render(&self.errors)),
            None => f.write_str(&render_list(&self.errors)),
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for MultiError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiError")
            .field("errors", &self.errors)
            .finish()
    }
}

impl<E> std::error::Error for MultiError<E> where E: fmt::Display + fmt::Debug {}

impl<E: PartialEq> PartialEq for MultiError<E> {
    fn eq(&self, other: &Self) -> bool {
        self.errors == other.errors
    }
}

impl<E> FromIterator<E> for MultiError<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
            formatter: None,
        }
    }
}

impl<E> Extend<E> for MultiError<E> {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

impl<E> IntoIterator for MultiError<E> {
    type Item = E;
    type IntoIter = std::vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a, E> IntoIterator for &'a MultiError<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
