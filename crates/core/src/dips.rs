//! DIP switch banks.
//!
//! Each instance carries three independent groups of switches: 4 system
//! flags, an 8-switch address byte, and an 8-switch data byte. Display order
//! is most-significant-first, so the leftmost switch of a group is the high
//! bit of its encoded value.

/// Number of system switches
pub const SYSTEM_LEN: usize = 4;
/// Number of address switches
pub const ADDR_LEN: usize = 8;
/// Number of data switches
pub const DATA_LEN: usize = 8;

/// System switch names in display order. The first entry is the high bit of
/// the encoded system byte, which is the engine's RAM bank select.
pub const SYSTEM_DIP_NAMES: [&str; SYSTEM_LEN] = ["RAM bank", "Backlight", "Custom A", "Custom B"];

/// Switch group selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DipGroup {
    System,
    Addr,
    Data,
}

/// One instance's worth of DIP switches, all initially off.
///
/// Switches are mutated only by [`DipBank::toggle`]; everything else reads.
pub struct DipBank {
    system: [bool; SYSTEM_LEN],
    addr: [bool; ADDR_LEN],
    data: [bool; DATA_LEN],
}

impl DipBank {
    pub fn new() -> Self {
        DipBank {
            system: [false; SYSTEM_LEN],
            addr: [false; ADDR_LEN],
            data: [false; DATA_LEN],
        }
    }

    fn cells(&self, group: DipGroup) -> &[bool] {
        match group {
            DipGroup::System => &self.system,
            DipGroup::Addr => &self.addr,
            DipGroup::Data => &self.data,
        }
    }

    fn cells_mut(&mut self, group: DipGroup) -> &mut [bool] {
        match group {
            DipGroup::System => &mut self.system,
            DipGroup::Addr => &mut self.addr,
            DipGroup::Data => &mut self.data,
        }
    }

    /// Flip one switch. `pos` is the display position, 0 = most significant.
    /// Out-of-range positions are ignored.
    pub fn toggle(&mut self, group: DipGroup, pos: usize) {
        let cells = self.cells_mut(group);
        if pos < cells.len() {
            cells[pos] = !cells[pos];
        }
    }

    /// Read one switch. Out-of-range positions read as off.
    pub fn get(&self, group: DipGroup, pos: usize) -> bool {
        self.cells(group).get(pos).copied().unwrap_or(false)
    }

    /// Fold a group into its unsigned value, most-significant cell first.
    ///
    /// Every cell is visited in display order via shift-and-OR, so the result
    /// is always in `[0, 2^len - 1]` and two reads without an intervening
    /// toggle are identical.
    pub fn encode(&self, group: DipGroup) -> u8 {
        let mut value = 0u8;
        for &on in self.cells(group) {
            value <<= 1;
            value |= on as u8;
        }
        value
    }
}

impl Default for DipBank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_msb_first() {
        let mut bank = DipBank::new();
        bank.toggle(DipGroup::Addr, 0);
        assert_eq!(bank.encode(DipGroup::Addr), 0x80);
        bank.toggle(DipGroup::Addr, 7);
        assert_eq!(bank.encode(DipGroup::Addr), 0x81);
        bank.toggle(DipGroup::System, 0);
        assert_eq!(bank.encode(DipGroup::System), 0b1000);
    }

    #[test]
    fn test_toggle_changes_by_bit_weight() {
        for (group, len) in [
            (DipGroup::System, SYSTEM_LEN),
            (DipGroup::Addr, ADDR_LEN),
            (DipGroup::Data, DATA_LEN),
        ] {
            let mut bank = DipBank::new();
            for k in 0..len {
                let before = bank.encode(group) as i32;
                bank.toggle(group, k);
                let after = bank.encode(group) as i32;
                assert_eq!(after - before, 1 << (len - 1 - k));
                bank.toggle(group, k);
                assert_eq!(bank.encode(group) as i32, before);
            }
        }
    }

    #[test]
    fn test_encode_idempotent() {
        let mut bank = DipBank::new();
        bank.toggle(DipGroup::Data, 2);
        bank.toggle(DipGroup::Data, 6);
        let first = bank.encode(DipGroup::Data);
        assert_eq!(bank.encode(DipGroup::Data), first);
        assert_eq!(first, 0b0010_0010);
    }

    #[test]
    fn test_out_of_range_toggle_ignored() {
        let mut bank = DipBank::new();
        bank.toggle(DipGroup::System, SYSTEM_LEN);
        bank.toggle(DipGroup::System, 99);
        assert_eq!(bank.encode(DipGroup::System), 0);
        assert!(!bank.get(DipGroup::System, 99));
    }

    #[test]
    fn test_groups_independent() {
        let mut bank = DipBank::new();
        bank.toggle(DipGroup::Addr, 4);
        assert_eq!(bank.encode(DipGroup::System), 0);
        assert_eq!(bank.encode(DipGroup::Data), 0);
        assert_eq!(bank.encode(DipGroup::Addr), 0x08);
    }
}
