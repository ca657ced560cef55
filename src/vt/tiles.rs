use crate::div_round_up;

/// Sparse tile offsets for a single mip stored as runs of consecutive addresses.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TileOffsetData {
    /// The mip width in tiles.
    pub width: u32,
    /// The mip height in tiles.
    pub height: u32,
    /// One past the largest tile address in this mip.
    pub max_address: u32,
    /// The first address of each run in increasing order.
    pub addresses: Vec<u32>,
    /// The tile offset of the first address in each run or `u32::MAX` if the run has no tiles.
    pub offsets: Vec<u32>,
}

impl TileOffsetData {
    /// The offset of the tile at `address` relative to the start of this mip
    /// or `None` if the tile is not present.
    pub fn tile_offset(&self, address: u32) -> Option<u32> {
        if address >= self.max_address {
            return None;
        }

        let run = self
            .addresses
            .partition_point(|a| *a <= address)
            .checked_sub(1)?;
        let base_offset = *self.offsets.get(run)?;
        if base_offset == u32::MAX {
            return None;
        }
        base_offset.checked_add(address.checked_sub(self.addresses[run])?)
    }
}

/// Locates tiles within the flat list of stored tiles for each mip.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TileOffsetTable {
    /// Older data stores every address of a mip, so the tile index is computed directly from
    /// the address and the mip's starting tile index.
    /// Missing tiles use `u32::MAX` as their offset in the chunk.
    #[default]
    Legacy,
    /// Per mip dimensions and runs of present tiles.
    Modern(Vec<TileOffsetData>),
}

/// A set of present tile addresses in `[0, len)` for a single mip.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TileMask {
    bits: Vec<u64>,
    len: u32,
}

impl TileMask {
    /// Creates a mask of `len` addresses with no tiles present.
    pub fn new(len: u32) -> Self {
        Self {
            bits: vec![0; div_round_up(len as usize, 64)],
            len,
        }
    }

    /// The number of addresses covered by the mask.
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Marks `address` as present. Addresses outside the mask are ignored.
    pub fn insert(&mut self, address: u32) {
        if address < self.len {
            self.bits[address as usize / 64] |= 1u64 << (address % 64);
        }
    }

    /// Marks `address` as absent.
    pub fn remove(&mut self, address: u32) {
        if address < self.len {
            self.bits[address as usize / 64] &= !(1u64 << (address % 64));
        }
    }

    pub fn contains(&self, address: u32) -> bool {
        address < self.len && self.bits[address as usize / 64] & (1u64 << (address % 64)) != 0
    }

    /// The number of present addresses.
    pub fn count(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// The present addresses in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len).filter(move |a| self.contains(*a))
    }
}
