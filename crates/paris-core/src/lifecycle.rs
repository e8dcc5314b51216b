//! Mutable state of one running traceroute instance.

/// Per-instance exploration state.
///
/// Owned by exactly one [`crate::Traceroute`]; only its transition
/// functions mutate it.
#[derive(Debug)]
pub struct ProbeLifecycleData<P> {
    /// Next hop to probe. Wider than the wire TTL so that the hop past
    /// `max_ttl = 255` stays representable.
    pub(crate) ttl: u16,
    pub(crate) num_replies: u32,
    pub(crate) num_stars: u32,
    pub(crate) num_undiscovered: u32,
    pub(crate) destination_reached: bool,
    pub(crate) probes: Vec<P>,
}

impl<P> ProbeLifecycleData<P> {
    pub fn new(min_ttl: u8) -> Self {
        Self {
            ttl: u16::from(min_ttl),
            num_replies: 0,
            num_stars: 0,
            num_undiscovered: 0,
            destination_reached: false,
            probes: Vec::new(),
        }
    }

    pub fn ttl(&self) -> u16 {
        self.ttl
    }

    /// Replies and timeouts received so far.
    pub fn num_replies(&self) -> u32 {
        self.num_replies
    }

    /// Timeouts received in the current batch.
    pub fn num_stars(&self) -> u32 {
        self.num_stars
    }

    /// Hops that answered with stars only.
    pub fn num_undiscovered(&self) -> u32 {
        self.num_undiscovered
    }

    pub fn destination_reached(&self) -> bool {
        self.destination_reached
    }

    /// Every probe sent by the instance, in send order.
    pub fn probes(&self) -> &[P] {
        &self.probes
    }

    /// True when every probe of the current batch has reported.
    pub fn is_batch_complete(&self, num_probes: u32) -> bool {
        num_probes != 0 && self.num_replies % num_probes == 0
    }

    /// Stores a sent probe and returns a reference to the stored copy.
    pub(crate) fn record_probe(&mut self, probe: P) -> &P {
        let index = self.probes.len();
        self.probes.push(probe);
        &self.probes[index]
    }

    pub(crate) fn into_probes(self) -> Vec<P> {
        self.probes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_lifecycle_data() {
        let data: ProbeLifecycleData<u8> = ProbeLifecycleData::new(4);
        assert_eq!(data.ttl(), 4);
        assert_eq!(data.num_replies(), 0);
        assert_eq!(data.num_stars(), 0);
        assert_eq!(data.num_undiscovered(), 0);
        assert!(!data.destination_reached());
        assert!(data.probes().is_empty());
    }

    #[test]
    fn test_batch_completion() {
        let mut data: ProbeLifecycleData<u8> = ProbeLifecycleData::new(1);
        assert!(data.is_batch_complete(3));
        data.num_replies = 2;
        assert!(!data.is_batch_complete(3));
        data.num_replies = 3;
        assert!(data.is_batch_complete(3));
        assert!(!data.is_batch_complete(0));
    }

    #[test]
    fn test_record_probe() {
        let mut data = ProbeLifecycleData::new(1);
        assert_eq!(*data.record_probe(7u8), 7);
        assert_eq!(*data.record_probe(9u8), 9);
        assert_eq!(data.into_probes(), vec![7, 9]);
    }
}
