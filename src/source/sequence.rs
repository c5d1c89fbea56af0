/// Hands out increasing sequence numbers for fetch requests.
///
/// The first number handed out is 1, so 0 can stand for "nothing applied".
#[derive(Debug, Default, Clone)]
pub struct SequenceCounter {
    last: u64,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next sequence number.
    pub fn next(&mut self) -> u64 {
        self.last += 1;
        self.last
    }
}
