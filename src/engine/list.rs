use crate::engine::value::Value;
use std::fmt;

/// An immutable sequence value.
///
/// Every operation that produces a list allocates fresh backing storage,
/// so no two lists ever share a buffer and a list derived via `rest` and
/// later `add` can never alias its source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct List {
    elements: Vec<Value>,
}

impl List {
    pub fn new(elements: Vec<Value>) -> Self {
        List { elements }
    }

    /// The first element, if any.
    pub fn first(&self) -> Option<&Value> {
        self.elements.first()
    }

    /// Everything except the first element. The rest of an empty list is
    /// an empty list.
    pub fn rest(&self) -> List {
        let tail = self.elements.get(1..).unwrap_or(&[]);
        List::new(tail.to_vec())
    }

    /// A new list with `el` appended. The receiver is untouched.
    pub fn add(&self, el: Value) -> List {
        let mut elements = self.elements.clone();
        elements.push(el);
        List::new(elements)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.elements.iter()
    }
}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;

        for (i, el) in self.elements.iter().enumerate() {
            if i != 0 {
                write!(f, " ")?;
            }
            write!(f, "{el}")?;
        }

        write!(f, ")")
    }
}
