//! Ordered sequence of finalized blocks and the cumulative symbol table
//! they build up

use std::sync::Arc;

use tracing::debug;

use crate::block::Block;
use crate::builder::BlockBuilder;
use crate::datalog::SymbolTable;
use crate::error::Error;

#[derive(Debug, Default)]
pub struct BlockChain {
    symbols: Arc<SymbolTable>,
    blocks: Vec<Block>,
}

impl BlockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a draft for the next block over the current cumulative table.
    pub fn create_block(&self) -> BlockBuilder {
        BlockBuilder::new(self.blocks.len() as u32, &self.symbols)
    }

    /// Merges the block's own symbols and keys into the cumulative table and
    /// appends it. Fails without changes if the block was drafted for another
    /// position or repeats an entry the chain already knows.
    pub fn append(&mut self, block: Block) -> Result<(), Error> {
        // a draft's ids are only valid over the table it was opened against
        if block.index as usize != self.blocks.len() {
            return Err(Error::OutOfOrderBlock { expected: self.blocks.len(), found: block.index });
        }
        if let Some(dup) = block.public_keys.iter().find(|k| self.symbols.public_key_index(k).is_some()) {
            return Err(Error::DuplicatePublicKey(dup.to_hex()));
        }

        // no draft holds the table anymore, so this is usually free
        let table = Arc::make_mut(&mut self.symbols);
        table.extend(&block.symbols)?;
        table.extend_public_keys(&block.public_keys)?;

        debug!(
            index = self.blocks.len(),
            symbols = table.current_offset(),
            public_keys = table.current_public_key_offset(),
            "appended block"
        );
        self.blocks.push(block);
        Ok(())
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
