use std::fmt;

#[derive(Clone, Copy, PartialEq)]
pub struct Connection {
    pub node: usize,
    pub weight: f32,
}

impl Connection {
    /// Creates a new Connection with the specified
    /// opposite-end node index and weight.
    pub fn new(node: usize, weight: f32) -> Connection {
        Connection { node, weight }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.9}", self.node, self.weight)
    }
}
