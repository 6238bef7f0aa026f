/*!
    Process data mappings: which dictionary entries travel in the cyclic buffers.

    A drive groups its process data in PDO objects (0x1600.. for the receive direction,
    0x1a00.. for the transmit direction). Each PDO lists its content as 32 bit mapping words
    packing `(object index, subindex, bit length)`. The order of the entries, PDO by PDO,
    defines the byte layout of the single on-wire process data buffer: every entry occupies
    `ceil(bitlength / 8)` whole bytes, entries are concatenated without further padding.

    [PdoMappings] holds both directions in packing order. It can be built from the UI
    configuration file (see [crate::config]) or read back from the device's own PDO
    configuration (see [crate::device::Device::read_pdo_mapping]).
*/

use bilge::prelude::*;

/// the 32 bit PDO mapping word as stored in the dictionary, LSB first
#[bitsize(32)]
#[derive(FromBits, DebugBits, Copy, Clone, Eq, PartialEq)]
pub struct PdoWord {
    /// size of the mapped entry in bits
    pub bitlength: u8,
    /// subindex of the mapped entry
    pub subindex: u8,
    /// dictionary index of the mapped entry
    pub index: u16,
}

/// one mapped entry of a PDO, expanded from its mapping word
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PdoMappingEntry {
    /// the owning PDO object, e.g. 0x1600 or 0x1a00
    pub pdo_index: u16,
    /// dictionary index of the mapped parameter
    pub index: u16,
    /// subindex of the mapped parameter
    pub subindex: u8,
    /// size of the entry in bits
    pub bitlength: u8,
}

impl PdoMappingEntry {
    /// expand a 32 bit mapping word found under `pdo_index`
    pub fn from_word(pdo_index: u16, word: u32) -> Self {
        let word = PdoWord::from(word);
        Self {
            pdo_index,
            index: word.index(),
            subindex: word.subindex(),
            bitlength: word.bitlength(),
        }
    }

    /// the 32 bit mapping word for this entry
    pub fn word(&self) -> u32 {
        PdoWord::new(self.bitlength, self.subindex, self.index).into()
    }

    /// bytes this entry occupies in the packed buffer, bits padded up to whole bytes
    pub fn byte_size(&self) -> usize {
        (usize::from(self.bitlength) + 7) / 8
    }
}

/**
    the mapped process data entries of the drive, in packing order

    `rx` is the host to device direction, `tx` the device to host direction. The position of
    an entry in its vector is its position in the packed buffer.
*/
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PdoMappings {
    pub rx: Vec<PdoMappingEntry>,
    pub tx: Vec<PdoMappingEntry>,
}

impl PdoMappings {
    /// byte size of the packed host to device buffer
    pub fn rx_packed_size(&self) -> usize {
        packed_size(&self.rx)
    }
    /// byte size of the packed device to host buffer
    pub fn tx_packed_size(&self) -> usize {
        packed_size(&self.tx)
    }
}

fn packed_size(entries: &[PdoMappingEntry]) -> usize {
    entries.iter().map(PdoMappingEntry::byte_size).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_expansion() {
        let entry = PdoMappingEntry::from_word(0x1600, 0x607a_0020);
        assert_eq!(entry, PdoMappingEntry {
            pdo_index: 0x1600,
            index: 0x607a,
            subindex: 0x00,
            bitlength: 0x20,
        });
        assert_eq!(entry.word(), 0x607a_0020);
    }

    #[test]
    fn word_with_subindex() {
        let entry = PdoMappingEntry::from_word(0x1a00, 0x2038_0110);
        assert_eq!(entry.index, 0x2038);
        assert_eq!(entry.subindex, 0x01);
        assert_eq!(entry.bitlength, 0x10);
    }

    #[test]
    fn entries_pad_up_to_whole_bytes() {
        let entry = PdoMappingEntry::from_word(0x1600, 0x6040_0001);
        assert_eq!(entry.byte_size(), 1);
        let entry = PdoMappingEntry::from_word(0x1600, 0x6040_0009);
        assert_eq!(entry.byte_size(), 2);
    }

    #[test]
    fn packed_sizes() {
        let mappings = PdoMappings {
            rx: vec![
                PdoMappingEntry::from_word(0x1600, 0x6040_0010),
                PdoMappingEntry::from_word(0x1600, 0x607a_0020),
            ],
            tx: vec![
                PdoMappingEntry::from_word(0x1a00, 0x6041_0010),
                PdoMappingEntry::from_word(0x1a00, 0x6064_0020),
                PdoMappingEntry::from_word(0x1a00, 0x2401_0008),
            ],
        };
        assert_eq!(mappings.rx_packed_size(), 6);
        assert_eq!(mappings.tx_packed_size(), 7);
    }
}
