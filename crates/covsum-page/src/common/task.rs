/// Identifies one submission. Everything a job produces (submit response,
/// stream messages, fallback timer) carries its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(pub u64);

/// Identifies one fetch whose response would replace the rendered result or
/// the history list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

#[derive(Debug, Default)]
pub struct JobSeq {
    next: u64,
}

impl JobSeq {
    pub fn next_id(&mut self) -> JobId {
        let id = JobId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

#[derive(Debug, Default)]
pub struct RequestSeq {
    next: u64,
}

impl RequestSeq {
    pub fn next_id(&mut self) -> RequestId {
        let id = RequestId(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_monotonic() {
        let mut jobs = JobSeq::default();
        assert_eq!(jobs.next_id(), JobId(0));
        assert_eq!(jobs.next_id(), JobId(1));

        let mut requests = RequestSeq::default();
        assert_ne!(requests.next_id(), requests.next_id());
    }
}
