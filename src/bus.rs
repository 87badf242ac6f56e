//! Register Bus
//!
//! A single-outstanding-transaction handshake in front of the register file.
//! A transaction is issued between ticks and committed by the next tick,
//! which also produces its [`Ack`]. Addresses inside the sample-memory window
//! belong to an external [`SampleMemory`] and take one extra tick.
//!
//! ```text
//! issue ──► tick N: commit + ack             (core registers)
//! issue ──► tick N: wait ──► tick N+1: ack   (sample memory)
//! ```
//!
//! A successful write anywhere is a heartbeat. A rejected one is not.

use crate::error::RegisterError;
use crate::registers::RegisterFile;
use serde::{Deserialize, Serialize};

/// First byte address of the sample-memory window.
pub const SAMPLE_MEM_BASE: u32 = 0x1000;

/// One past the last byte address of the sample-memory window.
pub const SAMPLE_MEM_END: u32 = 0x2000;

/// Words addressable through the sample-memory window.
pub const SAMPLE_MEM_WORDS: usize = ((SAMPLE_MEM_END - SAMPLE_MEM_BASE) / 4) as usize;

/// Whether `addr` falls inside the sample-memory window.
pub fn in_sample_window(addr: u32) -> bool {
    (SAMPLE_MEM_BASE..SAMPLE_MEM_END).contains(&addr)
}

/// High-latency memory behind the bus, addressed by byte offset from
/// [`SAMPLE_MEM_BASE`].
pub trait SampleMemory: Send {
    fn read_word(&mut self, offset: u32) -> Result<u32, RegisterError>;
    fn write_word(&mut self, offset: u32, value: u32) -> Result<(), RegisterError>;

    /// Return to power-on contents.
    fn clear(&mut self);
}

/// Plain word-addressed RAM filling the whole window.
#[derive(Debug, Clone)]
pub struct SampleRam {
    words: Vec<u32>,
}

impl SampleRam {
    pub fn new() -> Self {
        Self {
            words: vec![0; SAMPLE_MEM_WORDS],
        }
    }

    pub fn words(&self) -> &[u32] {
        &self.words
    }

    fn index(offset: u32) -> Result<usize, RegisterError> {
        let addr = SAMPLE_MEM_BASE + offset;
        if offset % 4 != 0 {
            return Err(RegisterError::Misaligned { addr });
        }
        let index = (offset / 4) as usize;
        if index >= SAMPLE_MEM_WORDS {
            return Err(RegisterError::Unmapped { addr });
        }
        Ok(index)
    }
}

impl Default for SampleRam {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleMemory for SampleRam {
    fn read_word(&mut self, offset: u32) -> Result<u32, RegisterError> {
        Ok(self.words[Self::index(offset)?])
    }

    fn write_word(&mut self, offset: u32, value: u32) -> Result<(), RegisterError> {
        let index = Self::index(offset)?;
        self.words[index] = value;
        Ok(())
    }

    fn clear(&mut self) {
        self.words.fill(0);
    }
}

/// A register transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum Transaction {
    Read { addr: u32 },
    Write { addr: u32, value: u32 },
}

impl Transaction {
    pub fn addr(&self) -> u32 {
        match *self {
            Transaction::Read { addr } | Transaction::Write { addr, .. } => addr,
        }
    }

    /// Ticks between issue and acknowledge.
    pub fn latency(&self) -> u8 {
        if in_sample_window(self.addr()) {
            2
        } else {
            1
        }
    }
}

/// Completion of a transaction. Reads carry the value, writes carry the
/// written value back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ack {
    pub transaction: Transaction,
    pub result: Result<u32, RegisterError>,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    transaction: Transaction,
    remaining: u8,
}

/// One-deep transaction queue.
#[derive(Debug, Clone, Default)]
pub struct Bus {
    pending: Option<Pending>,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a transaction. Fails with [`RegisterError::Busy`] while another
    /// one is outstanding.
    pub fn issue(&mut self, transaction: Transaction) -> Result<(), RegisterError> {
        if self.pending.is_some() {
            return Err(RegisterError::Busy);
        }
        self.pending = Some(Pending {
            transaction,
            remaining: transaction.latency(),
        });
        Ok(())
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<Transaction> {
        self.pending.map(|p| p.transaction)
    }

    /// Advance one tick, committing the outstanding transaction once its
    /// latency has elapsed.
    pub fn tick(&mut self, regs: &mut RegisterFile, memory: &mut dyn SampleMemory) -> Option<Ack> {
        let pending = self.pending.as_mut()?;
        pending.remaining -= 1;
        if pending.remaining > 0 {
            return None;
        }
        let transaction = pending.transaction;
        self.pending = None;

        let result = match transaction {
            Transaction::Read { addr } if in_sample_window(addr) => {
                memory.read_word(addr - SAMPLE_MEM_BASE)
            }
            Transaction::Read { addr } => regs.read(addr),
            Transaction::Write { addr, value } if in_sample_window(addr) => memory
                .write_word(addr - SAMPLE_MEM_BASE, value)
                .map(|()| {
                    regs.note_external_write();
                    value
                }),
            Transaction::Write { addr, value } => regs.write(addr, value).map(|()| value),
        };
        Some(Ack {
            transaction,
            result,
        })
    }

    /// Drop any outstanding transaction.
    pub fn reset(&mut self) {
        self.pending = None;
    }
}
