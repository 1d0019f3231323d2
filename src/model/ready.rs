use crate::error::AlreadyResolved;

/// A value that starts out pending and becomes ready exactly once.
///
/// There is no way to clear a resolved slot.
#[derive(Debug)]
pub struct ReadyOnce<T> {
    value: Option<T>,
}

impl<T> Default for ReadyOnce<T> {
    fn default() -> Self {
        Self::pending()
    }
}

impl<T> ReadyOnce<T> {
    pub fn pending() -> Self {
        Self { value: None }
    }

    /// Resolve the slot. A second call is rejected and the first value kept.
    pub fn resolve(&mut self, value: T) -> Result<&mut T, AlreadyResolved> {
        if self.value.is_some() {
            return Err(AlreadyResolved);
        }
        Ok(self.value.insert(value))
    }

    pub fn is_ready(&self) -> bool {
        self.value.is_some()
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }
}
