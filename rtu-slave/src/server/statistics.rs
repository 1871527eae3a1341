/// Selects one of the statistics counters
///
/// The discriminant is the offset of the counter's diagnostic sub-function from the
/// configured statistics base address.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u16)]
pub enum Counter {
    /// frames that passed the length check
    AnyReceived = 0,
    /// frames addressed to this device, including accepted broadcasts
    AddressedReceived = 1,
    /// successful responses transmitted
    OkSent = 2,
    /// error responses built
    ErrorSent = 3,
    /// frames discarded as invalid or requesting an unbound function
    InvalidReceived = 4,
}

impl Counter {
    /// map a sub-function offset to a counter
    pub fn from_offset(offset: u16) -> Option<Self> {
        match offset {
            0 => Some(Counter::AnyReceived),
            1 => Some(Counter::AddressedReceived),
            2 => Some(Counter::OkSent),
            3 => Some(Counter::ErrorSent),
            4 => Some(Counter::InvalidReceived),
            _ => None,
        }
    }
}

/// Counters kept by a device context. All counters are 16 bits wide and wrap.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Statistics {
    any_received: u16,
    addressed_received: u16,
    ok_sent: u16,
    error_sent: u16,
    invalid_received: u16,
}

impl Statistics {
    /// value of a single counter
    pub fn get(&self, counter: Counter) -> u16 {
        match counter {
            Counter::AnyReceived => self.any_received,
            Counter::AddressedReceived => self.addressed_received,
            Counter::OkSent => self.ok_sent,
            Counter::ErrorSent => self.error_sent,
            Counter::InvalidReceived => self.invalid_received,
        }
    }

    /// frames that passed the length check
    pub fn any_received(&self) -> u16 {
        self.any_received
    }

    /// frames addressed to this device
    pub fn addressed_received(&self) -> u16 {
        self.addressed_received
    }

    /// successful responses transmitted
    pub fn ok_sent(&self) -> u16 {
        self.ok_sent
    }

    /// error responses built
    pub fn error_sent(&self) -> u16 {
        self.error_sent
    }

    /// invalid frames discarded
    pub fn invalid_received(&self) -> u16 {
        self.invalid_received
    }

    pub(crate) fn increment(&mut self, counter: Counter) {
        let value = match counter {
            Counter::AnyReceived => &mut self.any_received,
            Counter::AddressedReceived => &mut self.addressed_received,
            Counter::OkSent => &mut self.ok_sent,
            Counter::ErrorSent => &mut self.error_sent,
            Counter::InvalidReceived => &mut self.invalid_received,
        };
        *value = value.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_select_counters() {
        let mut stats = Statistics::default();
        stats.increment(Counter::ErrorSent);
        stats.increment(Counter::ErrorSent);
        stats.increment(Counter::InvalidReceived);

        assert_eq!(stats.get(Counter::from_offset(3).unwrap()), 2);
        assert_eq!(stats.get(Counter::from_offset(4).unwrap()), 1);
        assert_eq!(stats.get(Counter::from_offset(0).unwrap()), 0);
        assert_eq!(Counter::from_offset(5), None);
    }

    #[test]
    fn counters_wrap() {
        let mut stats = Statistics {
            ok_sent: u16::MAX,
            ..Default::default()
        };
        stats.increment(Counter::OkSent);
        assert_eq!(stats.ok_sent(), 0);
    }
}
